//! Error types for the feature pipeline and scoring adapter.
//!
//! Column-level transform failures are normally reported as [`TransformFlag`]s
//! rather than returned, so a single bad cell never aborts a row. The
//! variants here are what escapes a row (schema problems, classifier
//! failures) or a process start (artifact loading).

use std::path::PathBuf;

use serde::Serialize;

/// Errors raised while building or running the scoring pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Required columns are absent from the input.
    #[error("missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// The configuration or manifest is inconsistent with what the pipeline
    /// can produce.
    #[error("schema error: {0}")]
    Schema(String),

    /// A specific column could not be transformed.
    #[error("transform failed for column '{column}': {reason}")]
    Transform { column: String, reason: String },

    /// The classifier call failed.
    #[error("model error: {0}")]
    UpstreamModel(String),

    /// A startup artifact could not be read or parsed.
    #[error("failed to load artifact {}: {reason}", .path.display())]
    Artifact { path: PathBuf, reason: String },
}

impl PipelineError {
    /// Create a missing-columns error, keeping the caller's column order.
    pub fn missing_columns<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PipelineError::MissingColumns {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this error describes a bad input schema (as opposed to an
    /// internal or model failure).
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingColumns { .. } | PipelineError::Schema(_)
        )
    }
}

/// Which transform stage raised a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStage {
    Binning,
    SkewCorrection,
}

impl std::fmt::Display for TransformStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformStage::Binning => write!(f, "binning"),
            TransformStage::SkewCorrection => write!(f, "skew correction"),
        }
    }
}

/// A column that was skipped for one row. The raw value was propagated (skew
/// correction) or left null (binning).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformFlag {
    pub stage: TransformStage,
    pub column: String,
    pub reason: String,
}

impl TransformFlag {
    pub fn into_error(self) -> PipelineError {
        PipelineError::Transform {
            column: self.column,
            reason: format!("{} skipped: {}", self.stage, self.reason),
        }
    }
}

impl std::fmt::Display for TransformFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} skipped for '{}': {}", self.stage, self.column, self.reason)
    }
}
