//! Information Value (IV) and Weight of Evidence (WoE) feature analysis
//!
//! Numeric features are binned with the same edge fitting the serving
//! pipeline uses; text features are grouped by category. Rows with a null
//! feature value form their own `MISSING` bin; rows with an unmapped target
//! are left out.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use super::binning::{BinMethod, BinSpec};
use super::target::{target_values, TargetMapping};

/// Smoothing term keeping WoE finite for empty classes
const WOE_EPSILON: f64 = 1e-10;

/// Default IV cut-off for feature selection
pub const DEFAULT_IV_THRESHOLD: f64 = 0.02;

/// Label of the bin holding null feature values
pub const MISSING_BIN: &str = "MISSING";

/// Feature type for IV analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Numeric,
    Categorical,
}

/// Conventional reading of an IV value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictivePower {
    Useless,
    Weak,
    Medium,
    Strong,
    Suspicious,
}

impl PredictivePower {
    pub fn from_iv(iv: f64) -> Option<Self> {
        if iv.is_nan() {
            return None;
        }
        Some(match iv {
            v if v < 0.02 => PredictivePower::Useless,
            v if v < 0.1 => PredictivePower::Weak,
            v if v < 0.3 => PredictivePower::Medium,
            v if v <= 0.5 => PredictivePower::Strong,
            _ => PredictivePower::Suspicious,
        })
    }
}

impl std::fmt::Display for PredictivePower {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictivePower::Useless => write!(f, "useless"),
            PredictivePower::Weak => write!(f, "weak"),
            PredictivePower::Medium => write!(f, "medium"),
            PredictivePower::Strong => write!(f, "strong"),
            PredictivePower::Suspicious => write!(f, "suspicious"),
        }
    }
}

/// WoE statistics for one bin or category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WoeBin {
    /// Bin interval, category value or `MISSING`
    pub label: String,
    pub count: usize,
    pub events: usize,
    pub non_events: usize,
    /// Share of all events falling in this bin
    pub event_rate: f64,
    /// Share of all non-events falling in this bin
    pub non_event_rate: f64,
    pub woe: f64,
    pub iv_contribution: f64,
}

/// IV analysis result for a single feature. `iv` is NaN when the feature
/// could not be analysed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvResult {
    pub feature: String,
    pub feature_type: FeatureType,
    pub iv: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bins: Vec<WoeBin>,
}

impl IvResult {
    fn failed(feature: &str, feature_type: FeatureType) -> Self {
        Self {
            feature: feature.to_string(),
            feature_type,
            iv: f64::NAN,
            bins: Vec::new(),
        }
    }

    pub fn power(&self) -> Option<PredictivePower> {
        PredictivePower::from_iv(self.iv)
    }
}

/// Every column except the target, in frame order
pub fn candidate_features(df: &DataFrame, target: &str) -> Vec<String> {
    df.get_column_names()
        .iter()
        .filter(|name| name.as_str() != target)
        .map(|name| name.to_string())
        .collect()
}

/// Calculate IV for `features` against a binary target.
///
/// Features run in parallel. A feature that fails is reported with NaN IV
/// and a warning instead of aborting the run. Results are sorted by IV
/// descending with NaN last.
pub fn analyze_features_iv(
    df: &DataFrame,
    features: &[String],
    target: &str,
    num_bins: usize,
    method: BinMethod,
    target_mapping: Option<&TargetMapping>,
) -> Result<Vec<IvResult>> {
    if num_bins == 0 {
        anyhow::bail!("Number of bins must be at least 1");
    }

    let target_values = target_values(df, target, target_mapping)?;
    let events = target_values.iter().filter(|t| **t == Some(1)).count();
    let non_events = target_values.iter().filter(|t| **t == Some(0)).count();
    if events == 0 || non_events == 0 {
        anyhow::bail!(
            "Target column '{}' needs both classes for IV analysis ({} events, {} non-events)",
            target,
            events,
            non_events
        );
    }

    let pb = ProgressBar::new(features.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "   Calculating IV [{bar:40.cyan/blue}] {pos}/{len} features ({percent}%) [{eta}]",
            )
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {}", e))?
            .progress_chars("=>-"),
    );

    let mut results: Vec<IvResult> = features
        .par_iter()
        .map(|feature| {
            let result = analyze_feature(df, feature, &target_values, num_bins, method);
            pb.inc(1);

            result.unwrap_or_else(|e| {
                warn!(feature = %feature, error = %e, "IV analysis failed");
                let feature_type = df
                    .column(feature)
                    .map(|c| feature_type_of(c.dtype()))
                    .unwrap_or(FeatureType::Numeric);
                IvResult::failed(feature, feature_type)
            })
        })
        .collect();

    pb.finish_with_message(format!("   [OK] Analyzed {} features", results.len()));

    results.sort_by(|a, b| match (a.iv.is_nan(), b.iv.is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => b.iv.partial_cmp(&a.iv).unwrap_or(std::cmp::Ordering::Equal),
    });

    Ok(results)
}

/// Features with IV at or above `threshold`, in result order
pub fn select_features_by_iv(results: &[IvResult], threshold: f64) -> Vec<String> {
    results
        .iter()
        .filter(|r| !r.iv.is_nan() && r.iv >= threshold)
        .map(|r| r.feature.clone())
        .collect()
}

fn feature_type_of(dtype: &DataType) -> FeatureType {
    if dtype.is_primitive_numeric() {
        FeatureType::Numeric
    } else {
        FeatureType::Categorical
    }
}

fn analyze_feature(
    df: &DataFrame,
    feature: &str,
    target_values: &[Option<i32>],
    num_bins: usize,
    method: BinMethod,
) -> Result<IvResult> {
    let col = df
        .column(feature)
        .with_context(|| format!("Feature '{}' not found", feature))?;
    let feature_type = feature_type_of(col.dtype());

    // (label, ordinal) per row; ordinal keeps numeric bins in edge order
    let keys: Vec<Option<(String, usize)>> = match feature_type {
        FeatureType::Numeric => {
            let values: Vec<f64> = col
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            let spec = BinSpec::fit(feature, &values, num_bins, method)?;
            let labels = interval_labels(&spec.edges);
            values
                .iter()
                .map(|&v| spec.assign(v).map(|idx| (labels[idx].clone(), idx)))
                .collect()
        }
        FeatureType::Categorical => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| (s.to_string(), 0)))
            .collect(),
    };

    // ordinal, label -> (events, non_events)
    let mut groups: BTreeMap<(usize, String), (usize, usize)> = BTreeMap::new();
    let mut missing = (0usize, 0usize);
    for (key, target) in keys.into_iter().zip(target_values) {
        let Some(t) = target else { continue };
        let slot = match key {
            Some((label, ordinal)) => groups.entry((ordinal, label)).or_default(),
            None => &mut missing,
        };
        if *t == 1 {
            slot.0 += 1;
        } else {
            slot.1 += 1;
        }
    }

    let mut grouped: Vec<(String, usize, usize)> = groups
        .into_iter()
        .map(|((_, label), (e, ne))| (label, e, ne))
        .collect();
    if missing.0 + missing.1 > 0 {
        grouped.push((MISSING_BIN.to_string(), missing.0, missing.1));
    }

    let total_events: usize = grouped.iter().map(|g| g.1).sum();
    let total_non_events: usize = grouped.iter().map(|g| g.2).sum();
    if total_events == 0 || total_non_events == 0 {
        anyhow::bail!("Feature '{}' has no variation in target over its rows", feature);
    }

    let bins: Vec<WoeBin> = grouped
        .into_iter()
        .map(|(label, events, non_events)| {
            woe_bin(feature, label, events, non_events, total_events, total_non_events)
        })
        .collect();
    let iv = bins.iter().map(|b| b.iv_contribution).sum();

    Ok(IvResult {
        feature: feature.to_string(),
        feature_type,
        iv,
        bins,
    })
}

/// WoE = ln(%events / %non-events); higher WoE means higher risk
fn woe_bin(
    feature: &str,
    label: String,
    events: usize,
    non_events: usize,
    total_events: usize,
    total_non_events: usize,
) -> WoeBin {
    let event_rate = events as f64 / total_events as f64;
    let non_event_rate = non_events as f64 / total_non_events as f64;

    let mut woe = ((event_rate + WOE_EPSILON) / (non_event_rate + WOE_EPSILON)).ln();
    if !woe.is_finite() {
        warn!(feature = %feature, bin = %label, "non-finite WoE replaced with 0");
        woe = 0.0;
    }

    WoeBin {
        label,
        count: events + non_events,
        events,
        non_events,
        event_rate,
        non_event_rate,
        woe,
        iv_contribution: (event_rate - non_event_rate) * woe,
    }
}

/// Right-closed interval labels for a set of edges
fn interval_labels(edges: &[f64]) -> Vec<String> {
    if edges.len() < 2 {
        return vec![format!("[{}]", edges.first().copied().unwrap_or(f64::NAN))];
    }
    edges
        .windows(2)
        .map(|w| format!("({:.4}, {:.4}]", w[0], w[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        // DTI separates the classes, Noise does not
        df! {
            "DTI_Ratio" => [0.1f64, 0.15, 0.2, 0.25, 0.3, 0.6, 0.65, 0.7, 0.75, 0.8],
            "Noise" => [1.0f64, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0],
            "Home_Owner" => ["Y", "Y", "Y", "Y", "N", "N", "N", "N", "N", "Y"],
            "Default_Flag" => ["No", "No", "No", "No", "No", "Yes", "Yes", "Yes", "Yes", "Yes"],
        }
        .unwrap()
    }

    fn run(features: &[&str]) -> Vec<IvResult> {
        let features: Vec<String> = features.iter().map(|s| s.to_string()).collect();
        analyze_features_iv(&frame(), &features, "Default_Flag", 2, BinMethod::Quantile, None).unwrap()
    }

    #[test]
    fn test_iv_ranks_predictive_feature_first() {
        let results = run(&["Noise", "DTI_Ratio", "Home_Owner"]);

        assert_eq!(results[0].feature, "DTI_Ratio");
        assert!(results[0].iv > 1.0);
        assert_eq!(results[0].feature_type, FeatureType::Numeric);
        let noise = results.iter().find(|r| r.feature == "Noise").unwrap();
        assert!(noise.iv < results[0].iv);
    }

    #[test]
    fn test_bin_rates_sum_to_one() {
        let results = run(&["Home_Owner"]);
        let r = &results[0];

        assert_eq!(r.feature_type, FeatureType::Categorical);
        let events: f64 = r.bins.iter().map(|b| b.event_rate).sum();
        let non_events: f64 = r.bins.iter().map(|b| b.non_event_rate).sum();
        assert!((events - 1.0).abs() < 1e-12);
        assert!((non_events - 1.0).abs() < 1e-12);
        let iv: f64 = r.bins.iter().map(|b| b.iv_contribution).sum();
        assert!((iv - r.iv).abs() < 1e-12);
    }

    #[test]
    fn test_failed_feature_is_nan_and_sorted_last() {
        let results = run(&["Not_A_Column", "DTI_Ratio"]);

        assert_eq!(results[0].feature, "DTI_Ratio");
        assert!(results[1].iv.is_nan());
        assert_eq!(results[1].power(), None);
    }

    #[test]
    fn test_missing_values_get_own_bin() {
        let df = df! {
            "Income" => [Some(1.0f64), None, Some(3.0), None],
            "Default_Flag" => [0i32, 1, 0, 1],
        }
        .unwrap();

        let results = analyze_features_iv(
            &df,
            &["Income".to_string()],
            "Default_Flag",
            2,
            BinMethod::Quantile,
            None,
        )
        .unwrap();
        assert!(results[0].bins.iter().any(|b| b.label == MISSING_BIN && b.events == 2));
    }

    #[test]
    fn test_select_features_by_iv() {
        let results = vec![
            IvResult { feature: "a".into(), feature_type: FeatureType::Numeric, iv: 0.5, bins: vec![] },
            IvResult { feature: "b".into(), feature_type: FeatureType::Numeric, iv: 0.02, bins: vec![] },
            IvResult { feature: "c".into(), feature_type: FeatureType::Numeric, iv: 0.01, bins: vec![] },
            IvResult { feature: "d".into(), feature_type: FeatureType::Numeric, iv: f64::NAN, bins: vec![] },
        ];

        assert_eq!(select_features_by_iv(&results, DEFAULT_IV_THRESHOLD), vec!["a", "b"]);
    }

    #[test]
    fn test_single_class_target_fails() {
        let df = df! {
            "x" => [1.0f64, 2.0],
            "Default_Flag" => [1i32, 1],
        }
        .unwrap();

        assert!(analyze_features_iv(&df, &["x".to_string()], "Default_Flag", 2, BinMethod::Quantile, None).is_err());
    }

    #[test]
    fn test_predictive_power_bands() {
        assert_eq!(PredictivePower::from_iv(0.01), Some(PredictivePower::Useless));
        assert_eq!(PredictivePower::from_iv(0.05), Some(PredictivePower::Weak));
        assert_eq!(PredictivePower::from_iv(0.2), Some(PredictivePower::Medium));
        assert_eq!(PredictivePower::from_iv(0.4), Some(PredictivePower::Strong));
        assert_eq!(PredictivePower::from_iv(0.9), Some(PredictivePower::Suspicious));
    }
}
