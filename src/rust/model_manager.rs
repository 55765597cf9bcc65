use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::env;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Digest};

use crate::classifier::{DiseaseModel, PredictorError};
use crate::inference::ModelProvider;
use crate::runtime::RuntimeConfig;
use crate::schema::FeatureSchema;

pub const DEFAULT_MODEL_NAME: &str = "cat_disease_model";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid manifest: {0}")]
    InvalidManifest(#[from] serde_json::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

impl From<ArtifactError> for PredictorError {
    fn from(err: ArtifactError) -> Self {
        PredictorError::ModelUnavailable(err.to_string())
    }
}

/// Optional `manifest.json` pinning artifact hashes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelManifest {
    pub model_sha256: Option<String>,
    pub labels_sha256: Option<String>,
}

/// Outcome of [`ModelStore::health_check`].
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub model_found: bool,
    pub labels_found: bool,
    pub message: String,
}

/// Locates, verifies and lazily loads the disease model artifacts.
///
/// A model directory holds `model.onnx`, `labels.json`, and optionally
/// `features.json` and `manifest.json`. The model is loaded at most once per
/// store; concurrent first callers wait on the same lock and share the result.
/// A failed load is not remembered, so the next call retries.
#[derive(Debug)]
pub struct ModelStore {
    models_dir: PathBuf,
    model_name: String,
    runtime_config: RuntimeConfig,
    loaded: Mutex<Option<Arc<DiseaseModel>>>,
}

impl ModelStore {
    /// Creates a new ModelStore with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("MEDIPREDICT_HOME") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("medipredict").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".medipredict").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("medipredict").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            runtime_config: RuntimeConfig::default(),
            loaded: Mutex::new(None),
        })
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_dir(&self) -> PathBuf {
        self.models_dir.join(&self.model_name)
    }

    pub fn get_model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    pub fn get_labels_path(&self) -> PathBuf {
        self.model_dir().join("labels.json")
    }

    pub fn get_features_path(&self) -> PathBuf {
        self.model_dir().join("features.json")
    }

    pub fn get_manifest_path(&self) -> PathBuf {
        self.model_dir().join("manifest.json")
    }

    pub fn is_model_available(&self) -> bool {
        let model_path = self.get_model_path();
        let labels_path = self.get_labels_path();
        log::info!("Checking if model is available:");
        log::info!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::info!("  Labels path: {:?} (exists: {})", labels_path, labels_path.exists());
        model_path.exists() && labels_path.exists()
    }

    fn hash_file(path: &Path) -> Result<String, ArtifactError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn verify_file(path: &Path, expected_hash: &str, file_type: &str) -> Result<(), ArtifactError> {
        log::info!("Verifying {} file: {:?}", file_type, path);
        let actual = Self::hash_file(path)?;
        if !actual.eq_ignore_ascii_case(expected_hash) {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected_hash, actual);
            return Err(ArtifactError::HashMismatch {
                file_type: file_type.to_string(),
                expected: expected_hash.to_string(),
                actual,
            });
        }
        Ok(())
    }

    pub fn read_manifest(&self) -> Result<Option<ModelManifest>, ArtifactError> {
        let path = self.get_manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Checks that the required artifacts exist and, when a manifest is
    /// present, that their SHA-256 hashes match it.
    pub fn verify_model(&self) -> Result<(), ArtifactError> {
        let model_path = self.get_model_path();
        let labels_path = self.get_labels_path();

        for path in [&model_path, &labels_path] {
            if !path.exists() {
                return Err(ArtifactError::NotFound(path.display().to_string()));
            }
        }

        match self.read_manifest()? {
            Some(manifest) => {
                if let Some(expected) = &manifest.model_sha256 {
                    Self::verify_file(&model_path, expected, "model")?;
                }
                if let Some(expected) = &manifest.labels_sha256 {
                    Self::verify_file(&labels_path, expected, "labels")?;
                }
                log::info!("Model artifacts verified against manifest");
            }
            None => log::info!("No manifest found, skipping hash verification"),
        }
        Ok(())
    }

    fn load_uncached(&self) -> Result<DiseaseModel, PredictorError> {
        self.verify_model()?;

        let features_path = self.get_features_path();
        let schema = if features_path.exists() {
            log::info!("Loading feature schema from {:?}", features_path);
            Arc::new(FeatureSchema::from_json_file(&features_path)?)
        } else {
            FeatureSchema::builtin()
        };

        DiseaseModel::builder()
            .with_name(self.model_name.clone())
            .with_runtime_config(self.runtime_config.clone())
            .with_schema(schema)
            .with_onnx_model(self.get_model_path())?
            .with_labels_file(self.get_labels_path())?
            .build()
    }

    /// Returns the shared model, loading it on first use.
    ///
    /// # Errors
    /// - `ModelUnavailable` if the artifacts are missing, fail verification, or
    ///   do not form a consistent model
    pub fn load(&self) -> Result<Arc<DiseaseModel>, PredictorError> {
        // slot only ever holds a fully loaded model
        let mut slot = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        log::info!("Loading model '{}' from {:?}", self.model_name, self.model_dir());
        let model = self.load_uncached().map_err(|e| {
            log::error!("Error loading model: {}", e);
            match e {
                PredictorError::ModelUnavailable(_) => e,
                other => PredictorError::ModelUnavailable(other.to_string()),
            }
        })?;

        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        log::info!("Model and labels loaded successfully");
        Ok(model)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Verifies that the artifacts exist and that the model can be loaded.
    pub fn health_check(&self) -> HealthReport {
        let model_found = self.get_model_path().exists();
        let labels_found = self.get_labels_path().exists();

        let (healthy, message) = match self.load() {
            Ok(model) => (true, format!(
                "Model '{}' loaded with {} classes", model.name(), model.codec().len()
            )),
            Err(e) => (false, e.to_string()),
        };

        HealthReport { healthy, model_found, labels_found, message }
    }
}

impl ModelProvider for ModelStore {
    fn model(&self) -> Result<Arc<DiseaseModel>, PredictorError> {
        self.load()
    }
}

impl ModelProvider for Arc<ModelStore> {
    fn model(&self) -> Result<Arc<DiseaseModel>, PredictorError> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path()).unwrap().with_model_name("test_model");
        assert!(store.get_model_path().ends_with("test_model/model.onnx"));
        assert!(store.get_labels_path().ends_with("test_model/labels.json"));
        assert!(!store.is_model_available());
    }

    #[test]
    fn test_missing_artifacts_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path()).unwrap();
        assert!(matches!(store.verify_model(), Err(ArtifactError::NotFound(_))));
        assert!(matches!(store.load(), Err(PredictorError::ModelUnavailable(_))));
        assert!(!store.is_loaded());

        let report = store.health_check();
        assert!(!report.healthy);
        assert!(!report.model_found);
    }

    #[derive(Debug)]
    struct Constant;

    impl crate::classifier::SymptomClassifier for Constant {
        fn predict(&self, _features: &crate::classifier::FeatureVector) -> Result<usize, PredictorError> {
            Ok(0)
        }

        fn predict_probabilities(&self, _features: &crate::classifier::FeatureVector) -> Result<Vec<f32>, PredictorError> {
            Ok(vec![1.0])
        }
    }

    #[test]
    fn test_panic_during_load_keeps_store_usable() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ModelStore::new(dir.path()).unwrap());

        let poisoner = Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _slot = poisoner.loaded.lock().unwrap();
            panic!("load aborted");
        }).join();
        assert!(joined.is_err());
        assert!(store.loaded.is_poisoned());

        // a fresh load attempt reports the real cause, not the poisoned lock
        let err = store.load().unwrap_err();
        assert!(matches!(err, PredictorError::ModelUnavailable(ref msg) if msg.contains("not found")));
        assert!(!store.is_loaded());

        let model = DiseaseModel::new(
            "cached",
            FeatureSchema::builtin(),
            Box::new(Constant),
            crate::classifier::LabelCodec::new(vec!["Acne".into()]).unwrap(),
        );
        *store.loaded.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(model));
        assert!(store.is_loaded());
        assert_eq!(store.load().unwrap().name(), "cached");
    }

    #[test]
    fn test_manifest_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path()).unwrap();
        fs::create_dir_all(store.model_dir()).unwrap();
        fs::write(store.get_model_path(), b"not really onnx").unwrap();
        fs::write(store.get_labels_path(), br#"["Acne"]"#).unwrap();
        fs::write(store.get_manifest_path(), r#"{"model_sha256": "00"}"#).unwrap();

        let err = store.verify_model().unwrap_err();
        assert!(matches!(err, ArtifactError::HashMismatch { ref file_type, .. } if file_type == "model"));
    }

    #[test]
    fn test_manifest_hash_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path()).unwrap();
        fs::create_dir_all(store.model_dir()).unwrap();
        fs::write(store.get_model_path(), b"model bytes").unwrap();
        fs::write(store.get_labels_path(), br#"["Acne"]"#).unwrap();

        let hash = ModelStore::hash_file(&store.get_labels_path()).unwrap();
        let manifest = ModelManifest { model_sha256: None, labels_sha256: Some(hash) };
        fs::write(store.get_manifest_path(), serde_json::to_string(&manifest).unwrap()).unwrap();

        assert!(store.verify_model().is_ok());
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var("MEDIPREDICT_HOME", "/tmp/medipredict-test");
        let path = ModelStore::get_default_models_dir();
        assert_eq!(path, PathBuf::from("/tmp/medipredict-test/models"));
        env::remove_var("MEDIPREDICT_HOME");

        let path = ModelStore::get_default_models_dir();
        assert!(path.ends_with("models"));
    }
}
