//! Fitted transform parameters persisted between training and serving.
//!
//! `fit_artifacts` runs once over the training sample; the resulting JSON is
//! loaded read-only at service start so the transforms applied at inference
//! are exactly the ones fitted at training time.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::binning::BinSpec;
use super::config::{PipelineConfig, SkewSelection};
use super::error::PipelineError;
use super::skew::{detect_skewed_columns, SkewParams};

/// Current on-disk format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Everything the transforms need at inference, apart from the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineArtifacts {
    pub format_version: u32,
    pub fitted_at: DateTime<Utc>,
    /// Raw applicant columns the pipeline accepts
    pub input_columns: Vec<String>,
    pub binning: Vec<BinSpec>,
    pub skew: Vec<SkewParams>,
}

impl PipelineArtifacts {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let artifact_err = |reason: String| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| artifact_err(e.to_string()))?;
        let artifacts: Self =
            serde_json::from_str(&text).map_err(|e| artifact_err(e.to_string()))?;

        if artifacts.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(artifact_err(format!(
                "unsupported format version {} (expected {})",
                artifacts.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        for spec in &artifacts.binning {
            spec.validate().map_err(|e| artifact_err(e.to_string()))?;
        }
        for params in &artifacts.skew {
            params.validate().map_err(|e| artifact_err(e.to_string()))?;
        }

        info!(
            path = %path.display(),
            bin_columns = artifacts.binning.len(),
            skew_columns = artifacts.skew.len(),
            "loaded pipeline artifacts"
        );
        Ok(artifacts)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize pipeline artifacts")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write pipeline artifacts to {}", path.display()))?;
        Ok(())
    }
}

/// Extract a column as `f64`, nulls and unparseable cells as NaN.
fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .with_context(|| format!("Column '{}' not found in training data", name))?;

    // non-strict: text cells that do not parse become null
    let float_col = col
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' cannot be read as numeric", name))?;

    Ok(float_col
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Fit bin edges and skew parameters on a training DataFrame.
pub fn fit_artifacts(df: &DataFrame, config: &PipelineConfig) -> Result<PipelineArtifacts> {
    config.validate()?;

    let input_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .filter(|name| !config.is_ignored(name))
        .collect();

    let mut binning = Vec::with_capacity(config.bin_columns.len());
    for column in &config.bin_columns {
        let values = column_as_f64(df, column)?;
        let spec = BinSpec::fit(column, &values, config.bins, config.bin_method)?;
        if spec.bin_count() < config.bins {
            warn!(
                column = %column,
                requested = config.bins,
                fitted = spec.bin_count(),
                "duplicate bin edges collapsed"
            );
        }
        debug!(column = %column, edges = ?spec.edges, "fitted bin edges");
        binning.push(spec);
    }

    let skew_columns: Vec<String> = match &config.skew_columns {
        SkewSelection::Columns(columns) => columns.clone(),
        SkewSelection::Auto { threshold, exclude } => {
            let candidates: Vec<(String, Vec<f64>)> = df
                .get_columns()
                .iter()
                .filter(|col| col.dtype().is_primitive_numeric())
                .map(|col| col.name().to_string())
                .filter(|name| {
                    !config.is_ignored(name)
                        && !config.bin_columns.contains(name)
                        && !exclude.contains(name)
                })
                .map(|name| column_as_f64(df, &name).map(|values| (name, values)))
                .collect::<Result<_>>()?;

            let detected = detect_skewed_columns(
                candidates.iter().map(|(n, v)| (n.as_str(), v.as_slice())),
                *threshold,
            );
            for (name, skew) in &detected {
                info!(column = %name, skew = %format!("{:.2}", skew), "selected for skew correction");
            }
            detected.into_iter().map(|(name, _)| name).collect()
        }
    };

    let mut skew = Vec::with_capacity(skew_columns.len());
    for column in &skew_columns {
        let values = column_as_f64(df, column)?;
        let params = SkewParams::fit(column, &values, config.skew_method)?;
        debug!(column = %column, params = ?params.transform, "fitted skew transform");
        skew.push(params);
    }

    Ok(PipelineArtifacts {
        format_version: ARTIFACT_FORMAT_VERSION,
        fitted_at: Utc::now(),
        input_columns,
        binning,
        skew,
    })
}
