//! Fit-time pipeline configuration
//!
//! Holds which columns are binned and skew-corrected and how. It is read
//! once by the `fit` command; serving reads only the persisted
//! [`PipelineArtifacts`](super::artifacts::PipelineArtifacts).

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::binning::BinMethod;
use super::skew::{SkewMethod, DEFAULT_SKEW_THRESHOLD};

/// Which columns get skew correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkewSelection {
    /// Exactly these columns
    Columns(Vec<String>),
    /// Every numeric input column (except binned and excluded ones) whose
    /// absolute skewness is at least `threshold`
    Auto {
        threshold: f64,
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl Default for SkewSelection {
    fn default() -> Self {
        SkewSelection::Columns(vec![
            "Months_Oldest_Trade".to_string(),
            "Avg_Deposit_Balance".to_string(),
        ])
    }
}

impl SkewSelection {
    pub fn auto() -> Self {
        SkewSelection::Auto {
            threshold: DEFAULT_SKEW_THRESHOLD,
            exclude: Vec::new(),
        }
    }
}

/// Parameters for fitting bin edges and skew transforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Binning method for all binned columns
    pub bin_method: BinMethod,
    /// Requested number of bins per column (duplicate edges may reduce it)
    pub bins: usize,
    /// Columns to bin; each produces `<column>_Bin`
    pub bin_columns: Vec<String>,
    /// Power transform family
    pub skew_method: SkewMethod,
    /// Columns to skew-correct
    pub skew_columns: SkewSelection,
    /// Target column, excluded from the declared inputs when present
    pub target: Option<String>,
    /// Columns never treated as model inputs (ids, timestamps)
    pub ignore_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bin_method: BinMethod::Quantile,
            bins: 5,
            bin_columns: vec![
                "Utilization_Ratio".to_string(),
                "DTI_Ratio".to_string(),
                "Income".to_string(),
            ],
            skew_method: SkewMethod::YeoJohnson,
            skew_columns: SkewSelection::default(),
            target: Some("Default_Flag".to_string()),
            ignore_columns: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse pipeline config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bins == 0 {
            anyhow::bail!("bins must be at least 1");
        }
        if let SkewSelection::Auto { threshold, .. } = &self.skew_columns {
            if !threshold.is_finite() || *threshold < 0.0 {
                anyhow::bail!("skew threshold must be a non-negative number, got {}", threshold);
            }
        }
        Ok(())
    }

    /// Whether `column` is excluded from the model inputs.
    pub fn is_ignored(&self, column: &str) -> bool {
        self.target.as_deref() == Some(column) || self.ignore_columns.iter().any(|c| c == column)
    }
}
