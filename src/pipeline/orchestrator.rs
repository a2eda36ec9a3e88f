//! Feature pipeline orchestration: binning, then skew correction, then
//! projection onto the feature manifest.
//!
//! Every row is transformed on its own from immutable fitted parameters, so
//! scoring a row alone or inside any batch yields identical model input.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::warn;

use super::artifacts::PipelineArtifacts;
use super::binning::BinSpec;
use super::error::{PipelineError, TransformFlag, TransformStage};
use super::manifest::{FeatureManifest, ModelInput};
use super::record::{Record, Value};
use super::skew::SkewParams;

/// A row after transformation and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub input: ModelInput,
    /// Columns skipped for this row
    pub flags: Vec<TransformFlag>,
}

/// The deterministic raw-row to model-input function.
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    binning: Vec<BinSpec>,
    skew: Vec<SkewParams>,
    manifest: FeatureManifest,
    required_columns: Vec<String>,
}

impl FeaturePipeline {
    /// Build the pipeline, checking that every manifest feature can be
    /// produced and every transform reads a declared input column.
    pub fn new(artifacts: PipelineArtifacts, manifest: FeatureManifest) -> Result<Self, PipelineError> {
        let inputs: HashSet<&str> = artifacts.input_columns.iter().map(|s| s.as_str()).collect();

        let undeclared: Vec<&str> = artifacts
            .binning
            .iter()
            .map(|s| s.column.as_str())
            .chain(artifacts.skew.iter().map(|p| p.column.as_str()))
            .filter(|c| !inputs.contains(c))
            .collect();
        if !undeclared.is_empty() {
            return Err(PipelineError::Schema(format!(
                "transformed column(s) not among the declared inputs: {}",
                undeclared.join(", ")
            )));
        }

        let mut bin_outputs = HashSet::new();
        for spec in &artifacts.binning {
            let output = spec.output_column();
            if inputs.contains(output.as_str()) || !bin_outputs.insert(output.clone()) {
                return Err(PipelineError::Schema(format!(
                    "binned column '{}' collides with another column",
                    output
                )));
            }
        }

        let unproducible: Vec<&str> = manifest
            .features()
            .iter()
            .map(|f| f.as_str())
            .filter(|f| !inputs.contains(f) && !bin_outputs.contains(*f))
            .collect();
        if !unproducible.is_empty() {
            return Err(PipelineError::Schema(format!(
                "manifest feature(s) not produced by the pipeline: {}",
                unproducible.join(", ")
            )));
        }

        let mut seen = HashSet::new();
        let required_columns: Vec<String> = artifacts
            .binning
            .iter()
            .map(|s| s.column.clone())
            .chain(artifacts.skew.iter().map(|p| p.column.clone()))
            .chain(
                manifest
                    .features()
                    .iter()
                    .filter(|f| !bin_outputs.contains(*f))
                    .cloned(),
            )
            .filter(|c| seen.insert(c.clone()))
            .collect();

        Ok(Self {
            binning: artifacts.binning,
            skew: artifacts.skew,
            manifest,
            required_columns,
        })
    }

    pub fn manifest(&self) -> &FeatureManifest {
        &self.manifest
    }

    /// Raw columns an input row must carry.
    pub fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    /// Required columns absent from `available`.
    pub fn missing_columns<'a, I>(&self, available: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available: HashSet<&str> = available.into_iter().collect();
        self.required_columns
            .iter()
            .filter(|c| !available.contains(c.as_str()))
            .cloned()
            .collect()
    }

    /// Apply binning then skew correction, keeping every column.
    pub fn transform(&self, record: &Record) -> (Record, Vec<TransformFlag>) {
        let mut out = record.clone();
        let mut flags = Vec::new();

        for spec in &self.binning {
            let raw = record.get(&spec.column).cloned().unwrap_or(Value::Null);
            let binned = match raw.as_f64().and_then(|v| spec.assign(v)) {
                Some(idx) => Value::Int(idx as i64),
                None => {
                    flags.push(TransformFlag {
                        stage: TransformStage::Binning,
                        column: spec.column.clone(),
                        reason: format!("value {} is not numeric", raw.describe()),
                    });
                    Value::Null
                }
            };
            out.insert(spec.output_column(), binned);
        }

        for params in &self.skew {
            let raw = record.get(&params.column).cloned().unwrap_or(Value::Null);
            match raw.as_f64().and_then(|v| params.apply(v)) {
                Some(corrected) => out.insert(params.column.clone(), corrected),
                None => {
                    // raw value propagates unchanged
                    flags.push(TransformFlag {
                        stage: TransformStage::SkewCorrection,
                        column: params.column.clone(),
                        reason: format!("value {} cannot be transformed", raw.describe()),
                    });
                }
            }
        }

        for flag in &flags {
            warn!(stage = %flag.stage, column = %flag.column, reason = %flag.reason, "transform skipped");
        }

        (out, flags)
    }

    /// Run one row through the full pipeline.
    pub fn run_one(&self, record: &Record) -> Result<PreparedRow, PipelineError> {
        let missing = self.missing_columns(record.columns());
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns { missing });
        }

        let (transformed, flags) = self.transform(record);
        let input = self.manifest.select(&transformed)?;
        Ok(PreparedRow { input, flags })
    }

    /// Run a batch. Rows are independent; the result at index `i` is the
    /// outcome of `records[i]`.
    pub fn run(&self, records: &[Record]) -> Vec<Result<PreparedRow, PipelineError>> {
        records.par_iter().map(|r| self.run_one(r)).collect()
    }
}
