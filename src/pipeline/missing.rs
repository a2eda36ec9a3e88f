//! Missing value analysis

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

/// Missing ratio above which `eda` calls a column out
pub const HIGH_MISSING_RATIO: f64 = 0.3;

/// Null count and ratio for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSummary {
    pub column: String,
    pub missing: usize,
    pub ratio: f64,
}

/// Count nulls per column, in column order.
///
/// Text cells that are empty after trimming count as missing too, since CSV
/// extracts use both spellings.
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<MissingSummary>> {
    let height = df.height();

    df.get_columns()
        .iter()
        .map(|col| {
            let mut missing = col.null_count();
            if col.dtype() == &DataType::String {
                missing += col
                    .str()?
                    .into_iter()
                    .filter(|v| matches!(v, Some(s) if s.trim().is_empty()))
                    .count();
            }
            Ok(MissingSummary {
                column: col.name().to_string(),
                missing,
                ratio: if height == 0 { 0.0 } else { missing as f64 / height as f64 },
            })
        })
        .collect()
}

/// Columns whose missing ratio exceeds `threshold`, excluding the target
pub fn get_features_above_threshold(
    summaries: &[MissingSummary],
    threshold: f64,
    target_column: Option<&str>,
) -> Vec<String> {
    summaries
        .iter()
        .filter(|s| s.ratio > threshold && Some(s.column.as_str()) != target_column)
        .map(|s| s.column.clone())
        .collect()
}
