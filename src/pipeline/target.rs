//! Target column analysis and encoding
//!
//! Raw training extracts carry the default flag as `Yes`/`No` text; IV
//! analysis and the stratified split need it as 0/1.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Mapping from raw target values to binary 0/1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMapping {
    /// Value that maps to 1 (event, e.g. default)
    pub event_value: String,
    /// Value that maps to 0 (non-event)
    pub non_event_value: String,
}

impl TargetMapping {
    pub fn new(event_value: &str, non_event_value: &str) -> Self {
        Self {
            event_value: event_value.to_string(),
            non_event_value: non_event_value.to_string(),
        }
    }

    fn encode(&self, value: &str) -> Option<i32> {
        let value = value.trim();
        if value == self.event_value {
            Some(1)
        } else if value == self.non_event_value {
            Some(0)
        } else {
            None
        }
    }
}

impl Default for TargetMapping {
    fn default() -> Self {
        Self::new("Yes", "No")
    }
}

/// Result of analyzing a target column
#[derive(Debug, Clone, PartialEq)]
pub enum TargetAnalysis {
    /// Already binary 0/1, no mapping needed
    AlreadyBinary,
    /// Needs a mapping; these are its distinct values
    NeedsMapping { unique_values: Vec<String> },
}

/// Decide whether a target column is already 0/1 or needs mapping
pub fn analyze_target_column(df: &DataFrame, target: &str) -> Result<TargetAnalysis> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if target_col.len() == 0 {
        anyhow::bail!("Target column '{}' is empty", target);
    }
    if target_col.null_count() == target_col.len() {
        anyhow::bail!("Target column '{}' contains only null values", target);
    }

    if target_col.dtype().is_primitive_numeric() {
        let unique = target_col.cast(&DataType::Float64)?.unique()?;
        let is_binary = unique
            .f64()?
            .into_iter()
            .flatten()
            .all(|v| v.abs() < TOLERANCE || (v - 1.0).abs() < TOLERANCE);

        if is_binary {
            return Ok(TargetAnalysis::AlreadyBinary);
        }
    }

    let mut unique_values: Vec<String> = column_as_strings(target_col)?
        .into_iter()
        .flatten()
        .collect();
    unique_values.sort();
    unique_values.dedup();

    Ok(TargetAnalysis::NeedsMapping { unique_values })
}

/// Cell values as text; nulls stay `None`
fn column_as_strings(col: &Column) -> Result<Vec<Option<String>>> {
    let text = match col.dtype() {
        DataType::Float32 | DataType::Float64 => {
            // keep 1.0 as "1" so numeric mappings match integer spellings
            return Ok(col
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect());
        }
        _ => col.cast(&DataType::String)?,
    };

    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Binary target vector: `Some(1)` event, `Some(0)` non-event, `None` for
/// nulls and values outside the mapping.
///
/// Binary numeric columns are read as-is; anything else goes through
/// `mapping` (default `Yes`/`No`).
pub fn target_values(
    df: &DataFrame,
    target: &str,
    mapping: Option<&TargetMapping>,
) -> Result<Vec<Option<i32>>> {
    let col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if mapping.is_none() && analyze_target_column(df, target)? == TargetAnalysis::AlreadyBinary {
        return Ok(col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(|n| i32::from(n > 0.5)))
            .collect());
    }

    let default_mapping = TargetMapping::default();
    let mapping = mapping.unwrap_or(&default_mapping);
    Ok(column_as_strings(col)?
        .iter()
        .map(|v| v.as_deref().and_then(|s| mapping.encode(s)))
        .collect())
}

/// Replace the target column with its 0/1 encoding (`Int32`, unmapped
/// values null).
pub fn encode_target(
    df: &DataFrame,
    target: &str,
    mapping: Option<&TargetMapping>,
) -> Result<DataFrame> {
    let encoded = target_values(df, target, mapping)?;
    let unmapped = encoded.iter().filter(|v| v.is_none()).count();
    if unmapped == encoded.len() {
        anyhow::bail!(
            "Target column '{}' has no values matching the event/non-event mapping",
            target
        );
    }
    if unmapped > 0 {
        tracing::warn!(target = %target, unmapped, "target values outside the mapping set to null");
    }

    let mut out = df.clone();
    out.with_column(Column::new(target.into(), encoded))?;
    Ok(out)
}

/// Count `(events, non_events, ignored)` in an encoded target vector
pub fn count_target_classes(values: &[Option<i32>]) -> (usize, usize, usize) {
    let events = values.iter().filter(|v| **v == Some(1)).count();
    let non_events = values.iter().filter(|v| **v == Some(0)).count();
    (events, non_events, values.len() - events - non_events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_binary_int_target() {
        let df = df! {
            "Default_Flag" => [0i32, 1, 0, 1, 0, 1],
        }
        .unwrap();

        let result = analyze_target_column(&df, "Default_Flag").unwrap();
        assert_eq!(result, TargetAnalysis::AlreadyBinary);
    }

    #[test]
    fn test_analyze_yes_no_target() {
        let df = df! {
            "Default_Flag" => ["Yes", "No", "No", "Yes", "No"],
        }
        .unwrap();

        match analyze_target_column(&df, "Default_Flag").unwrap() {
            TargetAnalysis::NeedsMapping { unique_values } => {
                assert_eq!(unique_values, vec!["No", "Yes"]);
            }
            other => panic!("Expected NeedsMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_analyze_non_binary_numeric_target() {
        let df = df! {
            "Default_Flag" => [1i32, 2, 3, 1],
        }
        .unwrap();

        assert!(matches!(
            analyze_target_column(&df, "Default_Flag").unwrap(),
            TargetAnalysis::NeedsMapping { .. }
        ));
    }

    #[test]
    fn test_encode_target_default_mapping() {
        let df = df! {
            "Default_Flag" => [Some("Yes"), Some("No"), Some(" No "), Some("maybe"), None],
            "Income" => [1.0f64, 2.0, 3.0, 4.0, 5.0],
        }
        .unwrap();

        let encoded = encode_target(&df, "Default_Flag", None).unwrap();
        let values: Vec<Option<i32>> = encoded
            .column("Default_Flag")
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();

        assert_eq!(values, vec![Some(1), Some(0), Some(0), None, None]);
        assert_eq!(encoded.width(), 2);
    }

    #[test]
    fn test_encode_already_binary_is_unchanged() {
        let df = df! {
            "Default_Flag" => [0.0f64, 1.0, 1.0],
        }
        .unwrap();

        let values = target_values(&df, "Default_Flag", None).unwrap();
        assert_eq!(values, vec![Some(0), Some(1), Some(1)]);
    }

    #[test]
    fn test_custom_mapping() {
        let df = df! {
            "status" => ["B", "G", "G", "X"],
        }
        .unwrap();

        let mapping = TargetMapping::new("B", "G");
        let values = target_values(&df, "status", Some(&mapping)).unwrap();
        assert_eq!(values, vec![Some(1), Some(0), Some(0), None]);
        assert_eq!(count_target_classes(&values), (1, 2, 1));
    }

    #[test]
    fn test_encode_fails_when_nothing_maps() {
        let df = df! {
            "Default_Flag" => ["Y", "N"],
        }
        .unwrap();

        let err = encode_target(&df, "Default_Flag", None).unwrap_err();
        assert!(err.to_string().contains("no values matching"));
    }

    #[test]
    fn test_analyze_all_null_target() {
        let df = df! {
            "Default_Flag" => [None::<String>, None, None],
        }
        .unwrap();

        let err = analyze_target_column(&df, "Default_Flag").unwrap_err();
        assert!(err.to_string().contains("null"));
    }
}
