use std::fmt;

mod error;
mod labels;
mod model;
mod onnx;
mod vector;
pub mod builder;

pub use error::PredictorError;
pub use labels::LabelCodec;
pub use model::DiseaseModel;
pub use onnx::OnnxClassifier;
pub use builder::ModelBuilder;
pub use vector::{parse_symptoms_json, FeatureVector, SymptomPresence, VectorBuilder, VectorReport};

/// The contract a trained tabular classifier has to satisfy.
///
/// Best class and class probabilities are two separate calls. Callers keep
/// them consistent by indexing the probabilities with the predicted index.
pub trait SymptomClassifier: Send + Sync + fmt::Debug {
    /// Returns the index of the most likely class.
    fn predict(&self, features: &FeatureVector) -> Result<usize, PredictorError>;

    /// Returns one probability per class, in label-index order.
    fn predict_probabilities(&self, features: &FeatureVector) -> Result<Vec<f32>, PredictorError>;

    /// Number of features the classifier accepts, when it declares one.
    fn input_width(&self) -> Option<usize> {
        None
    }
}

/// Information about a loaded disease model
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Name the model was registered under
    pub model_name: String,
    /// Number of features in the schema
    pub num_features: usize,
    /// Number of classes the classifier is trained on
    pub num_classes: usize,
    /// Disease names in label-index order
    pub class_labels: Vec<String>,
}
