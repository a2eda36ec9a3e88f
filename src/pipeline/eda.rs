//! Exploratory summary of a training extract

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::correlation::{correlation_matrix, CorrelationMatrix};
use super::missing::{
    analyze_missing_values, get_features_above_threshold, MissingSummary, HIGH_MISSING_RATIO,
};
use super::stats::{kurtosis, mean, quantile_sorted, skewness, sorted_finite, std_dev};

/// Describe-style statistics for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
    pub skewness: Option<f64>,
    /// Excess kurtosis
    pub kurtosis: Option<f64>,
}

impl NumericSummary {
    fn from_values(column: &str, values: &[f64]) -> Self {
        let sorted = sorted_finite(values);
        Self {
            column: column.to_string(),
            count: sorted.len(),
            mean: mean(&sorted),
            std: std_dev(&sorted),
            min: sorted.first().copied(),
            p25: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            p75: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied(),
            skewness: skewness(&sorted),
            kurtosis: kurtosis(&sorted),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaSummary {
    pub rows: usize,
    pub columns: usize,
    pub missing: Vec<MissingSummary>,
    /// Non-target columns missing more than `HIGH_MISSING_RATIO` of rows
    pub high_missing: Vec<String>,
    /// Distinct non-null values per column
    pub unique: Vec<(String, usize)>,
    pub numeric: Vec<NumericSummary>,
    /// Share of each target value, when a target was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_distribution: Option<BTreeMap<String, f64>>,
    pub correlation: CorrelationMatrix,
}

impl EdaSummary {
    /// Numeric columns with `|skewness| >= threshold`
    pub fn skewed_columns(&self, threshold: f64) -> Vec<(&str, f64)> {
        self.numeric
            .iter()
            .filter_map(|s| s.skewness.map(|k| (s.column.as_str(), k)))
            .filter(|(_, k)| k.abs() >= threshold)
            .collect()
    }

    pub fn save_json(&self, path: &std::path::Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize EDA summary")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write EDA summary to {}", path.display()))?;
        Ok(())
    }
}

/// Build the summary. `target`, when given, must exist.
pub fn run_eda_summary(df: &DataFrame, target: Option<&str>) -> Result<EdaSummary> {
    let (rows, columns) = df.shape();

    let unique = df
        .get_columns()
        .iter()
        .map(|col| {
            let n = col.n_unique()?;
            let distinct = if col.null_count() > 0 { n.saturating_sub(1) } else { n };
            Ok((col.name().to_string(), distinct))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut numeric = Vec::new();
    for col in df.get_columns() {
        if !col.dtype().is_primitive_numeric() {
            continue;
        }
        let values: Vec<f64> = col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        numeric.push(NumericSummary::from_values(col.name(), &values));
    }

    let target_distribution = match target {
        Some(target) => Some(target_distribution(df, target)?),
        None => None,
    };

    let missing = analyze_missing_values(df)?;
    let high_missing = get_features_above_threshold(&missing, HIGH_MISSING_RATIO, target);

    Ok(EdaSummary {
        rows,
        columns,
        missing,
        high_missing,
        unique,
        numeric,
        target_distribution,
        correlation: correlation_matrix(df, true)?,
    })
}

/// Normalized value counts of the target, nulls excluded
fn target_distribution(df: &DataFrame, target: &str) -> Result<BTreeMap<String, f64>> {
    let col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    let text = col.cast(&DataType::String)?;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in text.str()?.into_iter().flatten() {
        *counts.entry(value.to_string()).or_default() += 1;
    }

    let total: usize = counts.values().sum();
    Ok(counts
        .into_iter()
        .map(|(k, n)| (k, n as f64 / total.max(1) as f64))
        .collect())
}
