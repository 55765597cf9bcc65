use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use super::error::PredictorError;

/// Bidirectional mapping between classifier label indices and disease names.
///
/// The index space must be the one the classifier was trained with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCodec {
    labels: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelCodec {
    /// Creates a codec from labels in index order.
    pub fn new(labels: Vec<String>) -> Result<Self, PredictorError> {
        if labels.is_empty() {
            return Err(PredictorError::BuildError("Label codec needs at least one label".into()));
        }
        let mut index = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(PredictorError::BuildError(format!("Label {} is empty", i)));
            }
            if index.insert(label.clone(), i).is_some() {
                return Err(PredictorError::BuildError(format!("Duplicate label '{}'", label)));
            }
        }
        Ok(Self { labels, index })
    }

    /// Fits a codec the way the training pipeline encodes its target column:
    /// distinct names in sorted order.
    pub fn fit<I, S>(names: I) -> Result<Self, PredictorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self::new(distinct.into_iter().collect())
    }

    /// Loads a JSON array of disease names in index order.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, PredictorError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let labels: Vec<String> = serde_json::from_str(&raw)?;
        Self::new(labels)
    }

    pub fn encode(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
