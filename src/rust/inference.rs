//! Orchestrates feature alignment, classification and label decoding.

use std::sync::Arc;
use log::{info, warn};
use serde::Serialize;

use crate::classifier::{DiseaseModel, PredictorError, SymptomPresence};
use crate::statistics::{SymptomDataset, SymptomFrequencyEntry, SymptomStatistics};

/// Supplies the shared, read-only disease model.
///
/// [`crate::ModelStore`] implements this with a lazy one-time load; an
/// `Arc<DiseaseModel>` that is already loaded implements it trivially.
pub trait ModelProvider: Send + Sync {
    fn model(&self) -> Result<Arc<DiseaseModel>, PredictorError>;
}

impl ModelProvider for Arc<DiseaseModel> {
    fn model(&self) -> Result<Arc<DiseaseModel>, PredictorError> {
        Ok(Arc::clone(self))
    }
}

/// A predicted disease and the probability the classifier gave it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub disease: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A prediction annotated with the symptoms that most often accompany it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub prediction: String,
    pub confidence: f32,
    pub related_symptoms: Vec<SymptomFrequencyEntry>,
    pub model_used: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub struct InferenceService<P: ModelProvider> {
    provider: P,
}

impl<P: ModelProvider> InferenceService<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Predicts a disease for the given symptom presence mapping.
    ///
    /// Confidence is the probability at the *predicted* index. If that index
    /// is outside the probability array, the classifier and codec disagree on
    /// their index space; the maximum probability is used instead and the
    /// result carries a warning.
    ///
    /// # Errors
    /// - `ModelUnavailable` if the model cannot be loaded
    /// - `InvalidInput` if a symptom value is negative or not finite
    /// - `EmptyInput` if no symptom resolves to a set feature
    /// - `UnknownLabel` if the codec cannot decode the predicted index
    pub fn predict(&self, symptoms: &SymptomPresence) -> Result<PredictionResult, PredictorError> {
        let model = self.provider.model()?;
        Self::predict_with(&model, symptoms)
    }

    fn predict_with(model: &DiseaseModel, symptoms: &SymptomPresence) -> Result<PredictionResult, PredictorError> {
        let report = model.vector_builder().build_with_report(symptoms)?;
        if report.vector.is_zero() {
            return Err(PredictorError::EmptyInput);
        }

        let mut warnings: Vec<String> = report.unknown_symptoms.iter()
            .map(|name| format!("Symptom '{}' not found in model features", name))
            .collect();

        let classifier = model.classifier();
        let label_index = classifier.predict(&report.vector)?;
        let probabilities = classifier.predict_probabilities(&report.vector)?;

        let confidence = match probabilities.get(label_index) {
            Some(&p) => p,
            None => {
                let fallback = probabilities.iter().copied().fold(f32::NAN, f32::max);
                let message = format!(
                    "Predicted index {} is outside {} class probabilities; using the maximum probability",
                    label_index, probabilities.len()
                );
                warn!("Classifier/codec index mismatch: {}", message);
                warnings.push(message);
                fallback
            }
        };
        if !confidence.is_finite() {
            return Err(PredictorError::ModelError(format!(
                "Classifier returned no usable probability for index {}", label_index
            )));
        }
        let confidence = confidence.clamp(0.0, 1.0);

        let codec = model.codec();
        let disease = codec.decode(label_index)
            .ok_or(PredictorError::UnknownLabel { index: label_index, size: codec.len() })?
            .to_string();

        info!("Prediction: {} with confidence {:.4}", disease, confidence);

        Ok(PredictionResult { disease, confidence, warnings })
    }

    /// Predicts a disease and attaches the `top_n` symptoms most frequently
    /// recorded with it in `dataset`. Without a dataset no related symptoms
    /// are reported.
    pub fn diagnose(
        &self,
        symptoms: &SymptomPresence,
        dataset: Option<&SymptomDataset>,
        top_n: usize,
    ) -> Result<Diagnosis, PredictorError> {
        let model = self.provider.model()?;
        let result = Self::predict_with(&model, symptoms)?;
        let related_symptoms = dataset
            .map(|data| SymptomStatistics::new(data).top_symptoms(&result.disease, top_n))
            .unwrap_or_default();

        Ok(Diagnosis {
            prediction: result.disease,
            confidence: result.confidence,
            related_symptoms,
            model_used: model.name().to_string(),
            warnings: result.warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{FeatureVector, LabelCodec, SymptomClassifier};
    use crate::schema::{AliasTable, FeatureSchema};

    #[derive(Debug)]
    struct Scripted {
        label: usize,
        probabilities: Vec<f32>,
    }

    impl SymptomClassifier for Scripted {
        fn predict(&self, _features: &FeatureVector) -> Result<usize, PredictorError> {
            Ok(self.label)
        }

        fn predict_probabilities(&self, _features: &FeatureVector) -> Result<Vec<f32>, PredictorError> {
            Ok(self.probabilities.clone())
        }
    }

    fn service(label: usize, probabilities: Vec<f32>, labels: &[&str]) -> InferenceService<Arc<DiseaseModel>> {
        let schema = Arc::new(
            FeatureSchema::new(vec!["itching".into(), "chills".into()], AliasTable::default()).unwrap()
        );
        let codec = LabelCodec::new(labels.iter().map(|s| s.to_string()).collect()).unwrap();
        let model = DiseaseModel::new("scripted", schema, Box::new(Scripted { label, probabilities }), codec);
        InferenceService::new(Arc::new(model))
    }

    fn presence(pairs: &[(&str, f32)]) -> SymptomPresence {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_confidence_uses_predicted_index() {
        // predicted index is not the argmax; its own probability must be reported
        let service = service(0, vec![0.3, 0.7], &["Allergy", "Malaria"]);
        let result = service.predict(&presence(&[("itching", 1.0)])).unwrap();
        assert_eq!(result.disease, "Allergy");
        assert_eq!(result.confidence, 0.3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_index_mismatch_falls_back_with_warning() {
        let service = service(2, vec![0.25, 0.75], &["Allergy", "Malaria", "Typhoid"]);
        let result = service.predict(&presence(&[("chills", 1.0)])).unwrap();
        assert_eq!(result.disease, "Typhoid");
        assert_eq!(result.confidence, 0.75);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_undecodable_label_is_error() {
        let service = service(5, vec![0.5, 0.5], &["Allergy", "Malaria"]);
        let err = service.predict(&presence(&[("chills", 1.0)])).unwrap_err();
        assert!(matches!(err, PredictorError::UnknownLabel { index: 5, size: 2 }));
    }

    #[test]
    fn test_zero_vector_rejected() {
        let service = service(0, vec![1.0], &["Allergy"]);
        assert!(matches!(service.predict(&SymptomPresence::new()), Err(PredictorError::EmptyInput)));
        assert!(matches!(
            service.predict(&presence(&[("itching", 0.0), ("made_up_symptom", 1.0)])),
            Err(PredictorError::EmptyInput)
        ));
    }

    #[test]
    fn test_confidence_clamped() {
        let service = service(0, vec![1.0000002], &["Allergy"]);
        let result = service.predict(&presence(&[("itching", 1.0)])).unwrap();
        assert!((0.0..=1.0).contains(&result.confidence));
    }

    #[test]
    fn test_diagnose_without_dataset() {
        let service = service(1, vec![0.1, 0.9], &["Allergy", "Malaria"]);
        let diagnosis = service.diagnose(&presence(&[("chills", 1.0)]), None, 5).unwrap();
        assert_eq!(diagnosis.prediction, "Malaria");
        assert_eq!(diagnosis.model_used, "scripted");
        assert!(diagnosis.related_symptoms.is_empty());
    }
}
