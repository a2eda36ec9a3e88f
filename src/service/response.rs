//! Response payloads and their file renderings

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pipeline::write_csv;

/// Result of scoring one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinglePrediction {
    pub label: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Transform steps skipped for this record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPrediction {
    pub row_index: usize,
    pub label: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row_index: usize,
    pub message: String,
}

/// Outcome of a multi-row request. Every input row appears exactly once,
/// either as a prediction or as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub predictions: Vec<RowPrediction>,
    pub errors: Vec<RowError>,
}

impl BatchResponse {
    pub fn total_rows(&self) -> usize {
        self.predictions.len() + self.errors.len()
    }

    /// Predictions as a DataFrame (`row_index`, `label`, `score`)
    pub fn predictions_frame(&self) -> Result<DataFrame> {
        let df = df! {
            "row_index" => self.predictions.iter().map(|p| p.row_index as u64).collect::<Vec<_>>(),
            "label" => self.predictions.iter().map(|p| p.label).collect::<Vec<_>>(),
            "score" => self.predictions.iter().map(|p| p.score).collect::<Vec<_>>(),
        }?;
        Ok(df)
    }

    /// Write the predictions CSV
    pub fn write_predictions_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.predictions_frame()?;
        write_csv(&mut df, path)
    }

    /// Write the per-row error report as JSON
    pub fn write_error_report(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.errors)
            .context("Failed to serialize batch error report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write error report to {}", path.display()))?;
        Ok(())
    }
}

/// Response to a JSON prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Single(SinglePrediction),
    Batch(BatchResponse),
}
