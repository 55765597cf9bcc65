use std::collections::HashMap;
use std::path::Path;
use ndarray::Array2;
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use log::info;

use super::error::PredictorError;
use super::vector::FeatureVector;
use super::SymptomClassifier;
use crate::runtime::{create_session_builder, RuntimeConfig};

const LABEL_OUTPUT: &str = "label";
const PROBABILITY_OUTPUT: &str = "probabilities";

/// A classifier exported to ONNX and executed with ONNX Runtime.
///
/// The model is expected to:
/// - Accept one float input of shape [batch_size, num_features]
/// - Output the predicted label index as int64 (named `label`, or the first output)
/// - Output class probabilities of shape [batch_size, num_classes]
///   (named `probabilities`, or the second output)
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    label_output: String,
    probability_output: String,
    input_width: Option<usize>,
}

impl OnnxClassifier {
    /// Loads and validates an ONNX model file.
    ///
    /// # Errors
    /// - `BuildError` if the file does not exist or the model has the wrong structure
    /// - `ModelError` if ONNX Runtime fails to create the session
    pub fn from_file<P: AsRef<Path>>(path: P, config: &RuntimeConfig) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PredictorError::BuildError(format!("Model file not found: {}", path.display())));
        }

        let session = create_session_builder(config)?
            .commit_from_file(path)?;
        Self::from_session(session)
    }

    fn from_session(session: Session) -> Result<Self, PredictorError> {
        if session.inputs.is_empty() {
            return Err(PredictorError::BuildError(
                "Model must have at least 1 input for the feature vector".to_string()
            ));
        }
        if session.outputs.len() < 2 {
            return Err(PredictorError::BuildError(format!(
                "Model must have at least 2 outputs (label and probabilities), found {}",
                session.outputs.len()
            )));
        }

        let input_name = session.inputs[0].name.clone();
        let input_width = match &session.inputs[0].input_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .and_then(|&d| usize::try_from(d).ok())
                .filter(|&d| d > 0),
            _ => None,
        };

        let output_named = |wanted: &str, fallback: usize| {
            session.outputs.iter()
                .find(|o| o.name == wanted)
                .unwrap_or(&session.outputs[fallback])
                .name
                .clone()
        };
        let label_output = output_named(LABEL_OUTPUT, 0);
        let probability_output = output_named(PROBABILITY_OUTPUT, 1);

        info!(
            "Model structure validated: input '{}' (width {:?}), outputs '{}' and '{}'",
            input_name, input_width, label_output, probability_output
        );

        Ok(Self {
            session,
            input_name,
            label_output,
            probability_output,
            input_width,
        })
    }

    fn input_tensor(&self, features: &FeatureVector) -> Result<Tensor<f32>, PredictorError> {
        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| PredictorError::ModelError(format!("Failed to create input array: {}", e)))?;
        Tensor::from_array(input_array)
            .map_err(|e| PredictorError::ModelError(format!("Failed to create input tensor: {}", e)))
    }
}

impl SymptomClassifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<usize, PredictorError> {
        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.as_str(), self.input_tensor(features)?);

        let outputs = self.session.run(inputs)
            .map_err(|e| PredictorError::ModelError(format!("Failed to run model: {}", e)))?;
        let labels = outputs[self.label_output.as_str()].try_extract_tensor::<i64>()
            .map_err(|e| PredictorError::ModelError(format!("Failed to extract label tensor: {}", e)))?;

        let label = labels.iter().next().copied()
            .ok_or_else(|| PredictorError::ModelError("Model returned no label".into()))?;
        usize::try_from(label)
            .map_err(|_| PredictorError::ModelError(format!("Model returned negative label {}", label)))
    }

    fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f32>, PredictorError> {
        let mut inputs = HashMap::new();
        inputs.insert(self.input_name.as_str(), self.input_tensor(features)?);

        let outputs = self.session.run(inputs)
            .map_err(|e| PredictorError::ModelError(format!("Failed to run model: {}", e)))?;
        let probabilities = outputs[self.probability_output.as_str()].try_extract_tensor::<f32>()
            .map_err(|e| PredictorError::ModelError(format!("Failed to extract probability tensor: {}", e)))?;

        Ok(probabilities.iter().copied().collect())
    }

    fn input_width(&self) -> Option<usize> {
        self.input_width
    }
}
