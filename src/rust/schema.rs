//! Canonical symptom feature schema and the alias table that maps upstream
//! spellings onto it.
//!
//! The order of [`FeatureSchema`] is the column order the classifier was trained
//! with. Reordering it silently corrupts every prediction, so the schema is
//! immutable once built and is shared behind an `Arc`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;

use crate::classifier::PredictorError;

/// Training-time column order of the shipped disease model.
pub const BUILTIN_FEATURES: [&str; 132] = [
    "itching", "skin_rash", "nodal_skin_eruptions", "continuous_sneezing", "shivering",
    "chills", "joint_pain", "stomach_pain", "acidity", "ulcers_on_tongue",
    "muscle_wasting", "vomiting", "burning_micturition", "spotting_ urination",
    "fatigue", "weight_gain", "anxiety", "cold_hands_and_feets", "mood_swings",
    "weight_loss", "restlessness", "lethargy", "patches_in_throat",
    "irregular_sugar_level", "cough", "high_fever", "sunken_eyes", "breathlessness",
    "sweating", "dehydration", "indigestion", "headache", "yellowish_skin",
    "dark_urine", "nausea", "loss_of_appetite", "pain_behind_the_eyes", "back_pain",
    "constipation", "abdominal_pain", "diarrhoea", "mild_fever", "yellow_urine",
    "yellowing_of_eyes", "acute_liver_failure", "fluid_overload", "swelling_of_stomach",
    "swelled_lymph_nodes", "malaise", "blurred_and_distorted_vision", "phlegm",
    "throat_irritation", "redness_of_eyes", "sinus_pressure", "runny_nose",
    "congestion", "chest_pain", "weakness_in_limbs", "fast_heart_rate",
    "pain_during_bowel_movements", "pain_in_anal_region", "bloody_stool",
    "irritation_in_anus", "neck_pain", "dizziness", "cramps", "bruising", "obesity",
    "swollen_legs", "swollen_blood_vessels", "puffy_face_and_eyes", "enlarged_thyroid",
    "brittle_nails", "swollen_extremeties", "excessive_hunger",
    "extra_marital_contacts", "drying_and_tingling_lips", "slurred_speech", "knee_pain",
    "hip_joint_pain", "muscle_weakness", "stiff_neck", "swelling_joints",
    "movement_stiffness", "spinning_movements", "loss_of_balance", "unsteadiness",
    "weakness_of_one_body_side", "loss_of_smell", "bladder_discomfort",
    "foul_smell_of urine", "continuous_feel_of_urine", "passage_of_gases",
    "internal_itching", "toxic_look_(typhos)", "depression", "irritability",
    "muscle_pain", "altered_sensorium", "red_spots_over_body", "belly_pain",
    "abnormal_menstruation", "dischromic _patches", "watering_from_eyes",
    "increased_appetite", "polyuria", "family_history", "mucoid_sputum", "rusty_sputum",
    "lack_of_concentration", "visual_disturbances", "receiving_blood_transfusion",
    "receiving_unsterile_injections", "coma", "stomach_bleeding",
    "distention_of_abdomen", "history_of_alcohol_consumption", "fluid_overload.1",
    "blood_in_sputum", "prominent_veins_on_calf", "palpitations", "painful_walking",
    "pus_filled_pimples", "blackheads", "scurring", "skin_peeling",
    "silver_like_dusting", "small_dents_in_nails", "inflammatory_nails", "blister",
    "red_sore_around_nose", "yellow_crust_ooze",
];

/// Form and dataset spellings that differ from the training columns.
pub const BUILTIN_ALIASES: [(&str, &str); 3] = [
    ("spotting_urination", "spotting_ urination"),
    ("foul_smell_of_urine", "foul_smell_of urine"),
    ("dischromic_patches", "dischromic _patches"),
];

lazy_static! {
    static ref BUILTIN_SCHEMA: Arc<FeatureSchema> = Arc::new(
        FeatureSchema::new(
            BUILTIN_FEATURES.iter().map(|s| s.to_string()).collect(),
            AliasTable::builtin(),
        )
        .expect("built-in feature schema is consistent")
    );
}

/// Maps alternate or legacy symptom names onto canonical schema names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
}

impl AliasTable {
    pub fn new<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        Self {
            aliases: pairs
                .into_iter()
                .map(|(alias, canonical)| (alias.into(), canonical.into()))
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_ALIASES)
    }

    /// Returns the canonical name for a known alias, or `name` unchanged.
    pub fn canonicalize<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}

/// The ordered list of symptom features a classifier was trained on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
    index: HashMap<String, usize>,
    aliases: AliasTable,
}

impl FeatureSchema {
    /// Creates a schema, validating that:
    /// - the feature list is non-empty and free of duplicates
    /// - every alias points at an existing feature
    /// - no alias shadows a canonical feature name
    pub fn new(names: Vec<String>, aliases: AliasTable) -> Result<Self, PredictorError> {
        if names.is_empty() {
            return Err(PredictorError::SchemaError("Feature schema cannot be empty".into()));
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(PredictorError::SchemaError(format!("Feature {} has an empty name", i)));
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(PredictorError::SchemaError(format!("Duplicate feature '{}'", name)));
            }
        }

        for (alias, canonical) in aliases.iter() {
            if index.contains_key(alias) {
                return Err(PredictorError::SchemaError(format!(
                    "Alias '{}' collides with a canonical feature name", alias
                )));
            }
            if !index.contains_key(canonical) {
                return Err(PredictorError::SchemaError(format!(
                    "Alias '{}' points at unknown feature '{}'", alias, canonical
                )));
            }
        }

        Ok(Self { names, index, aliases })
    }

    /// The shared schema of the shipped disease model.
    pub fn builtin() -> Arc<FeatureSchema> {
        Arc::clone(&BUILTIN_SCHEMA)
    }

    /// Creates a schema from `names`, keeping only the built-in aliases that are
    /// valid for it.
    pub fn with_builtin_aliases(names: Vec<String>) -> Result<Self, PredictorError> {
        let known: std::collections::HashSet<&str> = names.iter().map(String::as_str).collect();
        let aliases = AliasTable::new(BUILTIN_ALIASES.iter().filter(|(alias, canonical)| {
            let keep = known.contains(canonical) && !known.contains(alias);
            if !keep {
                debug!("Dropping alias '{}' -> '{}' for this schema", alias, canonical);
            }
            keep
        }).copied());
        Self::new(names, aliases)
    }

    /// Loads a JSON array of feature names, in training order.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let names: Vec<String> = serde_json::from_str(&raw)?;
        Self::with_builtin_aliases(names)
    }

    pub fn canonicalize<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.canonicalize(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Canonicalizes `name` and returns its feature index, if any.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.index_of(self.canonicalize(name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
