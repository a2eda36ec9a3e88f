//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::{BinMethod, SkewMethod, TargetMapping, DEFAULT_INFER_SCHEMA_LENGTH};
use crate::service::{ServicePaths, DEFAULT_MODEL_DIR};

/// credscore - fit, inspect and serve a credit decisioning feature pipeline
#[derive(Parser, Debug)]
#[command(name = "credscore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where the service finds its startup artifacts
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Directory holding selected_features.json, transform_params.json and scorecard.json
    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// Feature manifest (overrides the one in --model-dir)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Fitted transform parameters (overrides the ones in --model-dir)
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Scorecard model (overrides the one in --model-dir)
    #[arg(long)]
    pub model: Option<PathBuf>,
}

impl ServiceArgs {
    pub fn paths(&self) -> ServicePaths {
        let defaults = ServicePaths::in_dir(&self.model_dir);
        ServicePaths {
            manifest: self.manifest.clone().unwrap_or(defaults.manifest),
            artifacts: self.artifacts.clone().unwrap_or(defaults.artifacts),
            model: self.model.clone().unwrap_or(defaults.model),
        }
    }
}

/// Optional event/non-event values for a text target column
#[derive(Args, Debug, Clone, Default)]
pub struct TargetValueArgs {
    /// Value in the target column that represents the EVENT (maps to 1).
    /// Defaults to "Yes" for text targets.
    #[arg(long, requires = "non_event_value")]
    pub event_value: Option<String>,

    /// Value in the target column that represents the NON-EVENT (maps to 0).
    /// Defaults to "No" for text targets.
    #[arg(long, requires = "event_value")]
    pub non_event_value: Option<String>,
}

impl TargetValueArgs {
    /// Explicit mapping when both values were given
    pub fn mapping(&self) -> Option<TargetMapping> {
        match (&self.event_value, &self.non_event_value) {
            (Some(event), Some(non_event)) => Some(TargetMapping::new(event, non_event)),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit bin edges and skew parameters on a training file
    Fit {
        /// Training data (CSV or Parquet)
        input: PathBuf,

        /// Pipeline config (JSON); defaults apply to missing fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path for the fitted parameters
        #[arg(short, long, default_value = "model/transform_params.json")]
        output: PathBuf,

        /// Override the number of bins from the config
        #[arg(long, value_parser = validate_bins)]
        bins: Option<usize>,

        /// Override the binning method ("quantile" or "uniform")
        #[arg(long)]
        bin_method: Option<BinMethod>,

        /// Override the skew method ("yeo-johnson" or "log")
        #[arg(long)]
        skew_method: Option<SkewMethod>,

        /// Pick skew columns automatically by |skewness| instead of the configured list
        #[arg(long, default_value = "false")]
        auto_skew: bool,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
        infer_schema_length: usize,
    },

    /// Score JSON records (object, list, or {"data": [...]})
    Predict {
        #[command(flatten)]
        service: ServiceArgs,

        /// JSON request file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fail rows with skipped transforms instead of scoring them
        #[arg(long, default_value = "false")]
        strict: bool,
    },

    /// Score a CSV file of applicants
    Score {
        /// Batch file (must be .csv with a header row)
        input: PathBuf,

        #[command(flatten)]
        service: ServiceArgs,

        /// Predictions CSV. Defaults to <input>_predictions.csv next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Row error report (JSON). Defaults to <input>_errors.json next to the input.
        #[arg(long)]
        errors: Option<PathBuf>,

        /// Fail rows with skipped transforms instead of scoring them
        #[arg(long, default_value = "false")]
        strict: bool,
    },

    /// Show the features the model expects
    Schema {
        #[command(flatten)]
        service: ServiceArgs,

        /// Also load the artifacts and model and list the raw input columns
        #[arg(long, default_value = "false")]
        required: bool,

        /// Print as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Rank features by Information Value against the target
    Iv {
        /// Training data (CSV or Parquet)
        input: PathBuf,

        /// Target column name
        #[arg(short, long, default_value = "Default_Flag")]
        target: String,

        #[command(flatten)]
        target_values: TargetValueArgs,

        /// Number of bins for numeric features
        #[arg(long, default_value = "5", value_parser = validate_bins)]
        bins: usize,

        /// Binning method for numeric features
        #[arg(long, default_value = "quantile")]
        bin_method: BinMethod,

        /// Keep features with IV at or above this value
        #[arg(long, default_value = "0.02", value_parser = validate_iv_threshold)]
        threshold: f64,

        /// Columns to leave out of the analysis (comma-separated)
        #[arg(long, value_delimiter = ',')]
        drop_columns: Vec<String>,

        /// JSON report path. Defaults to <input>_iv_analysis.json next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the selected features as a feature manifest
        #[arg(long)]
        manifest_out: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
        infer_schema_length: usize,
    },

    /// Print an exploratory summary of a dataset
    Eda {
        /// Data file (CSV or Parquet)
        input: PathBuf,

        /// Target column for the class distribution
        #[arg(short, long)]
        target: Option<String>,

        /// Also write the summary as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
        infer_schema_length: usize,
    },

    /// Stratified train/test split
    Split {
        /// Data file (CSV or Parquet)
        input: PathBuf,

        /// Target column to stratify on
        #[arg(short, long, default_value = "Default_Flag")]
        target: String,

        /// Fraction of each class sent to the test set
        #[arg(long, default_value = "0.2", value_parser = validate_test_size)]
        test_size: f64,

        /// Seed for the shuffle
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Encode the target to 0/1 before splitting
        #[arg(long, default_value = "false")]
        encode_target: bool,

        #[command(flatten)]
        target_values: TargetValueArgs,

        /// Output directory. Defaults to the input's directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of rows to use for schema inference (CSV only)
        #[arg(long, default_value_t = DEFAULT_INFER_SCHEMA_LENGTH)]
        infer_schema_length: usize,
    },
}

/// Sibling path `<stem><suffix>` in the input's directory
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}{}", stem, suffix))
}

/// Validator for bin counts
fn validate_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value == 0 {
        Err("bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for the IV selection threshold
fn validate_iv_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !value.is_finite() || value < 0.0 {
        Err(format!("threshold must be a non-negative number, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for the test fraction
fn validate_test_size(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "test_size must be between 0.0 and 1.0 (exclusive), got {}",
            value
        ))
    }
}
