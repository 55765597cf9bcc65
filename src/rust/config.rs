use std::env;
use std::path::PathBuf;

use crate::model_manager::{ModelStore, DEFAULT_MODEL_NAME};
use crate::runtime::RuntimeConfig;
use crate::statistics::{DEFAULT_LABEL_COLUMN, DEFAULT_TOP_N};

/// Where the model and the historical dataset live, and how to run them.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    pub models_dir: PathBuf,
    pub model_name: String,
    /// Historical dataset used for related-symptom statistics
    pub dataset_path: Option<PathBuf>,
    pub label_column: String,
    pub top_n: usize,
    pub runtime: RuntimeConfig,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            models_dir: ModelStore::get_default_models_dir(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            dataset_path: None,
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            top_n: DEFAULT_TOP_N,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl PredictorConfig {
    /// Defaults, with the dataset path taken from `MEDIPREDICT_DATASET` if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var("MEDIPREDICT_DATASET") {
            config.dataset_path = Some(PathBuf::from(path));
        }
        config
    }

    /// Creates the model store this configuration describes.
    pub fn model_store(&self) -> std::io::Result<ModelStore> {
        Ok(ModelStore::new(&self.models_dir)?
            .with_model_name(self.model_name.clone())
            .with_runtime_config(self.runtime.clone()))
    }
}
