use std::path::Path;
use std::sync::Arc;
use log::{info, error};

use super::error::PredictorError;
use super::labels::LabelCodec;
use super::model::DiseaseModel;
use super::onnx::OnnxClassifier;
use super::vector::FeatureVector;
use super::SymptomClassifier;
use crate::runtime::RuntimeConfig;
use crate::schema::FeatureSchema;

const DEFAULT_MODEL_NAME: &str = "disease_model";

/// A builder for constructing a DiseaseModel with a fluent interface.
#[derive(Default, Debug)]
pub struct ModelBuilder {
    name: Option<String>,
    schema: Option<Arc<FeatureSchema>>,
    classifier: Option<Box<dyn SymptomClassifier>>,
    codec: Option<LabelCodec>,
    runtime_config: RuntimeConfig,
}

impl ModelBuilder {
    /// Creates a new empty ModelBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use medipredict::ModelBuilder;
    ///
    /// let builder = ModelBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name reported as the model used for a prediction
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the runtime configuration used when loading an ONNX model.
    /// Must be called before [`ModelBuilder::with_onnx_model`] to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the feature schema. Defaults to the built-in 132-feature schema.
    pub fn with_schema(mut self, schema: Arc<FeatureSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Uses an in-process classifier instead of an ONNX model
    pub fn with_classifier<C: SymptomClassifier + 'static>(mut self, classifier: C) -> Result<Self, PredictorError> {
        if self.classifier.is_some() {
            return Err(PredictorError::BuildError("Classifier already set".to_string()));
        }
        self.classifier = Some(Box::new(classifier));
        Ok(self)
    }

    /// Loads an ONNX model file as the classifier
    ///
    /// # Returns
    /// * `Result<Self, PredictorError>` - The builder instance if successful, or an error if:
    ///   - A classifier is already set
    ///   - The path is empty or the file does not exist
    ///   - The model failed to load or has an invalid structure
    pub fn with_onnx_model<P: AsRef<Path>>(mut self, model_path: P) -> Result<Self, PredictorError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(PredictorError::BuildError("Model path cannot be empty".to_string()));
        }
        if self.classifier.is_some() {
            return Err(PredictorError::BuildError("Classifier already set".to_string()));
        }

        let classifier = OnnxClassifier::from_file(model_path, &self.runtime_config)
            .map_err(|e| {
                error!("Failed to load model {}: {}", model_path.display(), e);
                e
            })?;
        info!("Model loaded from {}", model_path.display());

        self.classifier = Some(Box::new(classifier));
        Ok(self)
    }

    pub fn with_labels(mut self, codec: LabelCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Loads the label codec from a JSON array of disease names
    pub fn with_labels_file<P: AsRef<Path>>(mut self, labels_path: P) -> Result<Self, PredictorError> {
        let codec = LabelCodec::from_json_file(labels_path.as_ref())
            .map_err(|e| {
                error!("Failed to load labels {}: {}", labels_path.as_ref().display(), e);
                PredictorError::BuildError(format!("Failed to load labels: {}", e))
            })?;
        info!("Loaded {} disease labels", codec.len());
        self.codec = Some(codec);
        Ok(self)
    }

    /// Builds and returns the final DiseaseModel instance
    ///
    /// # Returns
    /// * `Result<DiseaseModel, PredictorError>` - The model if successful, or an error if:
    ///   - No classifier or label codec is set
    ///   - The classifier declares an input width different from the schema length
    ///   - The classifier's probability output does not match the codec size
    pub fn build(self) -> Result<DiseaseModel, PredictorError> {
        let classifier = self.classifier
            .ok_or_else(|| PredictorError::BuildError("No classifier loaded".into()))?;
        let codec = self.codec
            .ok_or_else(|| PredictorError::BuildError("No label codec loaded".into()))?;
        let schema = self.schema.unwrap_or_else(FeatureSchema::builtin);

        if let Some(width) = classifier.input_width() {
            if width != schema.len() {
                return Err(PredictorError::BuildError(format!(
                    "Classifier expects {} features but the schema has {}",
                    width, schema.len()
                )));
            }
        }

        // Infer the class count by running a probe input
        let probe = FeatureVector::zeros(schema.len());
        let num_classes = classifier.predict_probabilities(&probe)
            .map_err(|e| PredictorError::BuildError(format!("Probe inference failed: {}", e)))?
            .len();
        if num_classes != codec.len() {
            return Err(PredictorError::BuildError(format!(
                "Classifier outputs {} classes but the label codec has {}",
                num_classes, codec.len()
            )));
        }
        info!("Model validated: {} features, {} classes", schema.len(), num_classes);

        let name = self.name.unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        Ok(DiseaseModel::new(name, schema, classifier, codec))
    }
}
