use ort::Error as OrtError;
use std::io;

/// Represents the different types of errors that can occur while predicting a disease.
///
/// Unknown symptom names and unknown diseases are deliberately absent: both are
/// diagnostics that are logged and degraded gracefully, never raised.
#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    /// The classifier or label codec could not be loaded
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// None of the submitted symptoms resolved to a schema feature
    #[error("No recognizable symptoms provided")]
    EmptyInput,
    /// A symptom was submitted with a value the feature vector cannot hold
    #[error("Invalid value for symptom '{symptom}': {reason}")]
    InvalidInput { symptom: String, reason: String },
    /// The symptom payload itself could not be interpreted
    #[error("Malformed symptom payload: {0}")]
    MalformedInput(String),
    /// The classifier predicted an index the label codec cannot decode
    #[error("Predicted label index {index} is outside the label codec ({size} labels)")]
    UnknownLabel { index: usize, size: usize },
    /// Error occurred while running the classifier
    #[error("Model error: {0}")]
    ModelError(String),
    /// Error occurred while assembling a model from its artifacts
    #[error("Build error: {0}")]
    BuildError(String),
    /// The feature schema or alias table violates its invariants
    #[error("Schema error: {0}")]
    SchemaError(String),
    /// The historical dataset could not be read
    #[error("Dataset error: {0}")]
    DatasetError(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PredictorError {
    /// Returns true when the failure was caused by the caller's input rather
    /// than by missing or broken model state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput | Self::InvalidInput { .. } | Self::MalformedInput(_)
        )
    }
}

impl From<OrtError> for PredictorError {
    fn from(err: OrtError) -> Self {
        PredictorError::ModelError(err.to_string())
    }
}
