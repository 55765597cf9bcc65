use std::collections::HashMap;
use std::sync::Arc;
use ndarray::Array1;
use log::{debug, warn};

use super::error::PredictorError;
use crate::schema::FeatureSchema;

/// A mapping from symptom name to presence (0/1, or a non-negative severity).
pub type SymptomPresence = HashMap<String, f32>;

/// A fixed-length feature vector, index-aligned to a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Array1<f32>,
}

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self { values: Array1::zeros(len) }
    }

    pub fn from_vec(values: Vec<f32>) -> Self {
        Self { values: Array1::from_vec(values) }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when no feature is set.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.values
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }
}

/// A feature vector together with the diagnostics gathered while building it.
#[derive(Debug, Clone)]
pub struct VectorReport {
    pub vector: FeatureVector,
    /// Input names that matched no schema feature, sorted
    pub unknown_symptoms: Vec<String>,
    /// `(input name, canonical name)` for every alias that was applied, sorted
    pub remapped: Vec<(String, String)>,
}

/// Builds feature vectors for a schema.
///
/// Each input value is written into the slot its canonical name addresses, so
/// the result does not depend on the iteration order of the input map. The one
/// exception is an alias collision: when two input names resolve to the same
/// feature with different values, whichever the map yields last wins. Hash map
/// order is unspecified, so that outcome is nondeterministic; it is logged as a
/// warning rather than resolved silently.
#[derive(Debug, Clone)]
pub struct VectorBuilder {
    schema: Arc<FeatureSchema>,
}

impl VectorBuilder {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn build(&self, symptoms: &SymptomPresence) -> Result<FeatureVector, PredictorError> {
        self.build_with_report(symptoms).map(|report| report.vector)
    }

    /// Builds the vector and reports unknown names and applied aliases.
    ///
    /// # Errors
    /// - `InvalidInput` if a value is negative or not finite
    pub fn build_with_report(&self, symptoms: &SymptomPresence) -> Result<VectorReport, PredictorError> {
        let mut values = vec![0.0f32; self.schema.len()];
        let mut writers: Vec<Option<&str>> = vec![None; self.schema.len()];
        let mut unknown_symptoms = Vec::new();
        let mut remapped = Vec::new();

        for (name, &value) in symptoms {
            if !value.is_finite() {
                return Err(PredictorError::InvalidInput {
                    symptom: name.clone(),
                    reason: format!("value must be finite, got {}", value),
                });
            }
            if value < 0.0 {
                return Err(PredictorError::InvalidInput {
                    symptom: name.clone(),
                    reason: format!("value must be non-negative, got {}", value),
                });
            }

            let canonical = self.schema.canonicalize(name);
            let Some(index) = self.schema.index_of(canonical) else {
                warn!("Symptom '{}' not found in model features, ignoring it", name);
                unknown_symptoms.push(name.clone());
                continue;
            };

            if canonical != name.as_str() {
                debug!("Mapped '{}' to '{}'", name, canonical);
                remapped.push((name.clone(), canonical.to_string()));
            }

            if let Some(previous) = writers[index] {
                if values[index] != value {
                    warn!(
                        "Symptoms '{}' and '{}' both resolve to '{}' with different values; keeping {}",
                        previous, name, canonical, value
                    );
                }
            }
            values[index] = value;
            writers[index] = Some(name.as_str());
        }

        unknown_symptoms.sort();
        remapped.sort();

        Ok(VectorReport {
            vector: FeatureVector::from_vec(values),
            unknown_symptoms,
            remapped,
        })
    }
}

/// Parses a JSON object of symptom name to presence.
///
/// Numbers are taken as-is and booleans map to 1/0. Any other value, or a
/// payload that is not an object, is rejected.
pub fn parse_symptoms_json(payload: &str) -> Result<SymptomPresence, PredictorError> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| PredictorError::MalformedInput(e.to_string()))?;

    let object = value.as_object()
        .ok_or_else(|| PredictorError::MalformedInput("expected a JSON object of symptoms".into()))?;

    let mut symptoms = SymptomPresence::with_capacity(object.len());
    for (name, raw) in object {
        let presence = match raw {
            serde_json::Value::Bool(b) => if *b { 1.0 } else { 0.0 },
            serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32).ok_or_else(|| {
                PredictorError::InvalidInput {
                    symptom: name.clone(),
                    reason: format!("unrepresentable number {}", n),
                }
            })?,
            other => {
                return Err(PredictorError::InvalidInput {
                    symptom: name.clone(),
                    reason: format!("expected a number, got {}", other),
                });
            }
        };
        symptoms.insert(name.clone(), presence);
    }
    Ok(symptoms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AliasTable;

    fn small_schema() -> Arc<FeatureSchema> {
        Arc::new(FeatureSchema::new(
            vec![
                "itching".into(),
                "skin_rash".into(),
                "nodal_skin_eruptions".into(),
                "dischromic _patches".into(),
            ],
            AliasTable::new([
                ("dischromic_patches", "dischromic _patches"),
                ("skin rash", "skin_rash"),
            ]),
        ).unwrap())
    }

    fn presence(pairs: &[(&str, f32)]) -> SymptomPresence {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_empty_input_gives_zero_vector() {
        let builder = VectorBuilder::new(small_schema());
        let vector = builder.build(&SymptomPresence::new()).unwrap();
        assert_eq!(vector.len(), 4);
        assert!(vector.is_zero());
    }

    #[test]
    fn test_canonical_names_set_their_slots() {
        let builder = VectorBuilder::new(small_schema());
        let vector = builder.build(&presence(&[("itching", 1.0), ("nodal_skin_eruptions", 1.0)])).unwrap();
        assert_eq!(vector.to_vec(), vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_alias_sets_canonical_slot() {
        let builder = VectorBuilder::new(small_schema());
        let report = builder.build_with_report(&presence(&[("dischromic_patches", 1.0)])).unwrap();
        assert_eq!(report.vector.get(3), Some(1.0));
        assert_eq!(report.remapped, vec![("dischromic_patches".to_string(), "dischromic _patches".to_string())]);
    }

    #[test]
    fn test_unknown_symptom_is_dropped() {
        let builder = VectorBuilder::new(small_schema());
        let with_unknown = builder
            .build_with_report(&presence(&[("itching", 1.0), ("made_up_symptom", 1.0)]))
            .unwrap();
        let without = builder.build(&presence(&[("itching", 1.0)])).unwrap();
        assert_eq!(with_unknown.vector, without);
        assert_eq!(with_unknown.unknown_symptoms, vec!["made_up_symptom".to_string()]);
    }

    #[test]
    fn test_agreeing_alias_collision_is_stable() {
        let builder = VectorBuilder::new(small_schema());
        let vector = builder.build(&presence(&[("skin_rash", 1.0), ("skin rash", 1.0)])).unwrap();
        assert_eq!(vector.get(1), Some(1.0));
    }

    #[test]
    fn test_differing_alias_collision_keeps_one_input() {
        let builder = VectorBuilder::new(small_schema());
        let vector = builder.build(&presence(&[("skin_rash", 1.0), ("skin rash", 0.0)])).unwrap();
        assert_eq!(vector.len(), 4);
        let slot = vector.get(1).unwrap();
        assert!(slot == 1.0 || slot == 0.0);
        assert_eq!(vector.get(0), Some(0.0));
        assert_eq!(vector.get(2), Some(0.0));
        assert_eq!(vector.get(3), Some(0.0));
    }

    #[test]
    fn test_builtin_aliases_set_canonical_slot() {
        let schema = FeatureSchema::builtin();
        let builder = VectorBuilder::new(Arc::clone(&schema));
        assert!(!schema.aliases().is_empty());
        for (alias, canonical) in schema.aliases().iter() {
            let vector = builder.build(&presence(&[(alias, 1.0)])).unwrap();
            let index = schema.index_of(canonical).unwrap();
            assert_eq!(vector.len(), schema.len());
            assert_eq!(vector.get(index), Some(1.0), "alias {} -> {}", alias, canonical);
            assert_eq!(vector.as_array().sum(), 1.0);
        }
    }

    #[test]
    fn test_invalid_values_rejected() {
        let builder = VectorBuilder::new(small_schema());
        let err = builder.build(&presence(&[("itching", f32::NAN)])).unwrap_err();
        assert!(matches!(err, PredictorError::InvalidInput { ref symptom, .. } if symptom == "itching"));

        let err = builder.build(&presence(&[("skin_rash", -1.0)])).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_parse_symptoms_json() {
        let parsed = parse_symptoms_json(r#"{"itching": 1, "skin_rash": true, "chills": 0}"#).unwrap();
        assert_eq!(parsed["itching"], 1.0);
        assert_eq!(parsed["skin_rash"], 1.0);
        assert_eq!(parsed["chills"], 0.0);
    }

    #[test]
    fn test_parse_symptoms_json_rejects_bad_values() {
        assert!(matches!(
            parse_symptoms_json(r#"["itching"]"#),
            Err(PredictorError::MalformedInput(_))
        ));
        assert!(matches!(
            parse_symptoms_json(r#"{"itching": "yes"}"#),
            Err(PredictorError::InvalidInput { .. })
        ));
        assert!(matches!(
            parse_symptoms_json(r#"{"itching": null}"#),
            Err(PredictorError::InvalidInput { .. })
        ));
    }
}
