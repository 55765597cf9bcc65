//! Disease prediction from a sparse set of reported symptoms.
//!
//! Symptom names from any upstream producer are aligned to the exact feature
//! order a trained classifier expects, the classifier is run, its label index
//! is decoded to a disease name, and the prediction can be annotated with the
//! symptoms that most often accompany that disease in historical data.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use medipredict::{InferenceService, ModelStore, SymptomPresence};
//!
//! let service = InferenceService::new(ModelStore::new_default()?);
//!
//! let mut symptoms = SymptomPresence::new();
//! symptoms.insert("itching".to_string(), 1.0);
//! symptoms.insert("skin_rash".to_string(), 1.0);
//! symptoms.insert("dischromic_patches".to_string(), 0.0);
//!
//! let result = service.predict(&symptoms)?;
//! println!("Predicted disease: {} ({:.2})", result.disease, result.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The model is loaded once and never mutated, so a service can be shared
//! across threads using `Arc`:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use medipredict::{InferenceService, ModelStore, SymptomPresence};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let service = Arc::new(InferenceService::new(ModelStore::new_default()?));
//!
//! let mut handles = vec![];
//! for _ in 0..3 {
//!     let service = Arc::clone(&service);
//!     handles.push(thread::spawn(move || {
//!         let symptoms = SymptomPresence::from([("cough".to_string(), 1.0)]);
//!         service.predict(&symptoms).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod inference;
pub mod model_manager;
mod runtime;
pub mod schema;
pub mod statistics;

pub use classifier::{
    parse_symptoms_json, ClassifierInfo, DiseaseModel, FeatureVector, LabelCodec, ModelBuilder,
    OnnxClassifier, PredictorError, SymptomClassifier, SymptomPresence, VectorBuilder, VectorReport,
};
pub use config::PredictorConfig;
pub use inference::{Diagnosis, InferenceService, ModelProvider, PredictionResult};
pub use model_manager::{ArtifactError, HealthReport, ModelManifest, ModelStore};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use schema::{AliasTable, FeatureSchema};
pub use statistics::{SymptomDataset, SymptomFrequencyEntry, SymptomStatistics};

pub fn init_logger() {
    env_logger::init();
}
