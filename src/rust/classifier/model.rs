use std::sync::Arc;

use super::labels::LabelCodec;
use super::vector::VectorBuilder;
use super::{ClassifierInfo, SymptomClassifier};
use crate::schema::FeatureSchema;

/// A trained classifier bundled with the schema and label codec of its training run.
///
/// # Thread Safety
///
/// A `DiseaseModel` is never mutated after it is built, so one instance can be
/// shared across request threads behind an `Arc` without locking:
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use medipredict::ModelStore;
/// use std::sync::Arc;
/// use std::thread;
///
/// let store = Arc::new(ModelStore::new_default()?);
/// let model = store.load()?;
///
/// let model_clone = Arc::clone(&model);
/// thread::spawn(move || {
///     println!("{} classes", model_clone.codec().len());
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DiseaseModel {
    name: String,
    schema: Arc<FeatureSchema>,
    classifier: Box<dyn SymptomClassifier>,
    codec: LabelCodec,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<DiseaseModel>();
    }
};

impl DiseaseModel {
    /// Bundles the parts without cross-checking them. Prefer
    /// [`DiseaseModel::builder`], which verifies that the classifier, schema and
    /// codec share one feature and label space.
    pub fn new(
        name: impl Into<String>,
        schema: Arc<FeatureSchema>,
        classifier: Box<dyn SymptomClassifier>,
        codec: LabelCodec,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            classifier,
            codec,
        }
    }

    /// Creates a new ModelBuilder for fluent construction
    pub fn builder() -> super::builder::ModelBuilder {
        super::builder::ModelBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn classifier(&self) -> &dyn SymptomClassifier {
        self.classifier.as_ref()
    }

    pub fn codec(&self) -> &LabelCodec {
        &self.codec
    }

    pub fn vector_builder(&self) -> VectorBuilder {
        VectorBuilder::new(Arc::clone(&self.schema))
    }

    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            model_name: self.name.clone(),
            num_features: self.schema.len(),
            num_classes: self.codec.len(),
            class_labels: self.codec.labels().to_vec(),
        }
    }
}
