//! Disease-conditioned symptom frequencies over a historical labeled dataset.

use std::fs;
use std::path::Path;
use log::{info, warn};
use serde::Serialize;

use crate::classifier::PredictorError;

pub const DEFAULT_LABEL_COLUMN: &str = "prognosis";
pub const DEFAULT_TOP_N: usize = 5;

/// How often a symptom was recorded for a disease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomFrequencyEntry {
    pub symptom: String,
    pub count: u64,
}

/// A flat table of symptom columns plus one disease label per row.
///
/// Symptom columns are taken as they appear in the data; they may include
/// names the classifier's schema does not know.
#[derive(Debug, Clone, Default)]
pub struct SymptomDataset {
    columns: Vec<String>,
    labels: Vec<String>,
    rows: Vec<Vec<f32>>,
}

impl SymptomDataset {
    /// Creates a dataset from in-memory rows.
    ///
    /// # Errors
    /// - `DatasetError` if a row's width differs from the column count
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<(String, Vec<f32>)>,
    ) -> Result<Self, PredictorError> {
        let mut labels = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        for (i, (label, row)) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(PredictorError::DatasetError(format!(
                    "Row {} has {} values, expected {}", i + 1, row.len(), columns.len()
                )));
            }
            labels.push(label);
            values.push(row);
        }
        Ok(Self { columns, labels, rows: values })
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P, label_column: &str) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            PredictorError::DatasetError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_csv_str(&text, label_column)?;
        info!(
            "Loaded dataset from {} with {} rows and {} symptom columns",
            path.display(), dataset.len(), dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Parses comma-separated text with a header row.
    ///
    /// Columns with an empty or `Unnamed: *` header are export artifacts and
    /// are dropped. Empty lines are skipped. An empty symptom cell counts as 0.
    /// Label cells are kept verbatim, surrounding whitespace included, so they
    /// compare equal to the labels the model was trained on.
    pub fn from_csv_str(text: &str, label_column: &str) -> Result<Self, PredictorError> {
        let mut lines = text.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next()
            .ok_or_else(|| PredictorError::DatasetError("Dataset is empty".into()))?;
        let header: Vec<&str> = header.split(',').map(str::trim).collect();

        let label_index = header.iter().position(|&h| h == label_column)
            .ok_or_else(|| PredictorError::DatasetError(format!(
                "Label column '{}' not found", label_column
            )))?;

        let symptom_indices: Vec<usize> = header.iter()
            .enumerate()
            .filter(|&(i, h)| i != label_index && !h.is_empty() && !h.starts_with("Unnamed:"))
            .map(|(i, _)| i)
            .collect();
        let columns = symptom_indices.iter().map(|&i| header[i].to_string()).collect();

        let mut labels = Vec::new();
        let mut rows = Vec::new();
        for (line_no, line) in lines {
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() != header.len() {
                return Err(PredictorError::DatasetError(format!(
                    "Line {} has {} cells, expected {}", line_no + 1, cells.len(), header.len()
                )));
            }

            let mut row = Vec::with_capacity(symptom_indices.len());
            for &i in &symptom_indices {
                let cell = cells[i].trim();
                let value = if cell.is_empty() {
                    0.0
                } else {
                    cell.parse::<f32>().map_err(|_| PredictorError::DatasetError(format!(
                        "Line {}, column '{}': '{}' is not a number", line_no + 1, header[i], cell
                    )))?
                };
                row.push(value);
            }
            labels.push(cells[label_index].to_string());
            rows.push(row);
        }

        Ok(Self { columns, labels, rows })
    }

    /// Symptom column names in original column order.
    pub fn symptom_columns(&self) -> &[String] {
        &self.columns
    }

    /// Distinct disease labels in order of first appearance.
    pub fn diseases(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.labels.iter()
            .map(String::as_str)
            .filter(|label| seen.insert(*label))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-only aggregation over a [`SymptomDataset`].
#[derive(Debug, Clone, Copy)]
pub struct SymptomStatistics<'a> {
    dataset: &'a SymptomDataset,
}

impl<'a> SymptomStatistics<'a> {
    pub fn new(dataset: &'a SymptomDataset) -> Self {
        Self { dataset }
    }

    /// Returns the `top_n` symptoms recorded most often for `disease`, highest
    /// count first, ties kept in column order.
    ///
    /// An unknown disease yields an empty list and a warning, never an error.
    pub fn top_symptoms(&self, disease: &str, top_n: usize) -> Vec<SymptomFrequencyEntry> {
        let mut totals = vec![0.0f64; self.dataset.columns.len()];
        let mut matched = 0usize;

        for (label, row) in self.dataset.labels.iter().zip(&self.dataset.rows) {
            if label != disease {
                continue;
            }
            matched += 1;
            for (total, &value) in totals.iter_mut().zip(row) {
                *total += f64::from(value);
            }
        }

        if matched == 0 {
            warn!("No data found for disease: {}", disease);
            return Vec::new();
        }

        let mut entries: Vec<SymptomFrequencyEntry> = self.dataset.columns.iter()
            .zip(totals)
            .map(|(symptom, total)| SymptomFrequencyEntry {
                symptom: symptom.clone(),
                count: total.max(0.0).round() as u64,
            })
            .collect();

        // stable: equal counts stay in column order
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries.truncate(top_n);
        entries
    }
}
