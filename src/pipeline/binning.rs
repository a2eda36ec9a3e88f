//! Quantile and uniform binning of continuous columns.
//!
//! Cut points are fitted once on a reference (training) sample and stored in
//! a [`BinSpec`]. Assigning a value to a bin only reads the stored edges, so
//! the result never depends on which other values share the batch.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::stats::{quantile_sorted, sorted_finite};

/// Suffix appended to a source column to name its binned output.
pub const BIN_SUFFIX: &str = "_Bin";

/// How cut points are placed over the reference sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinMethod {
    /// Equal-population bins from sample quantiles (default)
    #[default]
    Quantile,
    /// Equal-width bins over the sample range
    Uniform,
}

impl std::fmt::Display for BinMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinMethod::Quantile => write!(f, "quantile"),
            BinMethod::Uniform => write!(f, "uniform"),
        }
    }
}

impl std::str::FromStr for BinMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quantile" => Ok(BinMethod::Quantile),
            "uniform" => Ok(BinMethod::Uniform),
            _ => Err(format!(
                "Unknown bin method: '{}'. Use 'quantile' or 'uniform'.",
                s
            )),
        }
    }
}

/// Fitted cut points for one binned column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinSpec {
    /// Source column read by the transform
    pub column: String,
    /// Method the edges were fitted with (informational at inference)
    pub method: BinMethod,
    /// Ascending, de-duplicated edges; `edges.len() - 1` bins
    pub edges: Vec<f64>,
}

impl BinSpec {
    /// Fit edges for `column` from a reference sample.
    ///
    /// Non-finite values are ignored. Fails only when no finite value is
    /// left; a constant sample yields a single bin.
    pub fn fit(column: &str, values: &[f64], bins: usize, method: BinMethod) -> Result<Self> {
        if bins == 0 {
            anyhow::bail!("Number of bins must be at least 1 for column '{}'", column);
        }

        let sorted = sorted_finite(values);
        if sorted.is_empty() {
            anyhow::bail!(
                "Column '{}' has no finite values to fit bin edges on",
                column
            );
        }

        let edges = match method {
            BinMethod::Quantile => quantile_edges(&sorted, bins),
            BinMethod::Uniform => uniform_edges(sorted[0], sorted[sorted.len() - 1], bins),
        };

        Ok(Self {
            column: column.to_string(),
            method,
            edges,
        })
    }

    /// Name of the column this spec writes.
    pub fn output_column(&self) -> String {
        format!("{}{}", self.column, BIN_SUFFIX)
    }

    /// Number of bins (at least 1).
    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1).max(1)
    }

    /// Bin index for a single value.
    ///
    /// Bins are right-closed `(e_i, e_{i+1}]` with the first bin also taking
    /// its lower edge. Values beyond the fitted range clamp to the first or
    /// last bin. Returns `None` for NaN.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        if self.edges.len() <= 2 {
            return Some(0);
        }
        let interior = &self.edges[1..self.edges.len() - 1];
        Some(interior.partition_point(|&edge| edge < value))
    }

    /// Bin every value of a column; NaN maps to `None`.
    pub fn bin(&self, values: &[f64]) -> Vec<Option<usize>> {
        values.iter().map(|&v| self.assign(v)).collect()
    }

    /// Check that the edges are usable at inference.
    pub fn validate(&self) -> Result<()> {
        if self.edges.is_empty() {
            anyhow::bail!("Bin spec for '{}' has no edges", self.column);
        }
        if self.edges.iter().any(|e| !e.is_finite()) {
            anyhow::bail!("Bin spec for '{}' has non-finite edges", self.column);
        }
        if self.edges.windows(2).any(|w| w[0] >= w[1]) {
            anyhow::bail!(
                "Bin edges for '{}' must be strictly ascending: {:?}",
                self.column,
                self.edges
            );
        }
        Ok(())
    }
}

/// Edges at the `0, 1/k, ..., 1` quantiles, duplicates collapsed
fn quantile_edges(sorted: &[f64], bins: usize) -> Vec<f64> {
    let mut edges: Vec<f64> = (0..=bins)
        .filter_map(|i| quantile_sorted(sorted, i as f64 / bins as f64))
        .collect();
    edges.dedup_by(|a, b| a == b);
    edges
}

/// `bins` equal-width intervals; the lower edge is widened by 0.1% of the
/// range so the minimum falls inside the first bin.
fn uniform_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    if min == max {
        let pad = if min == 0.0 { 0.001 } else { 0.001 * min.abs() };
        let (lo, hi) = (min - pad, max + pad);
        return linspace(lo, hi, bins + 1);
    }

    let mut edges = linspace(min, max, bins + 1);
    edges[0] -= (max - min) * 0.001;
    edges
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utilization_sample() -> Vec<f64> {
        (0..100).map(|i| i as f64 / 100.0).collect()
    }

    #[test]
    fn test_quantile_fit_five_bins() {
        let spec = BinSpec::fit("Utilization_Ratio", &utilization_sample(), 5, BinMethod::Quantile)
            .unwrap();
        assert_eq!(spec.bin_count(), 5);
        assert_eq!(spec.edges.len(), 6);
        assert_eq!(spec.assign(0.0), Some(0));
        assert_eq!(spec.assign(0.42), Some(2));
        assert_eq!(spec.assign(0.99), Some(4));
    }

    #[test]
    fn test_out_of_range_clamps() {
        let spec = BinSpec::fit("x", &utilization_sample(), 5, BinMethod::Quantile).unwrap();
        assert_eq!(spec.assign(-10.0), Some(0));
        assert_eq!(spec.assign(10.0), Some(4));
        assert_eq!(spec.assign(f64::INFINITY), Some(4));
        assert_eq!(spec.assign(f64::NAN), None);
    }

    #[test]
    fn test_right_closed_boundaries() {
        let spec = BinSpec {
            column: "x".to_string(),
            method: BinMethod::Quantile,
            edges: vec![0.0, 1.0, 2.0, 3.0],
        };
        assert_eq!(spec.assign(0.0), Some(0));
        assert_eq!(spec.assign(1.0), Some(0));
        assert_eq!(spec.assign(1.0001), Some(1));
        assert_eq!(spec.assign(2.0), Some(1));
        assert_eq!(spec.assign(3.0), Some(2));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        // Heavy mass at zero: several quantiles coincide
        let mut values = vec![0.0; 80];
        values.extend((1..=20).map(|i| i as f64));
        let spec = BinSpec::fit("x", &values, 5, BinMethod::Quantile).unwrap();
        assert!(spec.bin_count() < 5);
        spec.validate().unwrap();
    }

    #[test]
    fn test_constant_column_single_bin() {
        let spec = BinSpec::fit("x", &[7.0; 20], 5, BinMethod::Quantile).unwrap();
        assert_eq!(spec.bin_count(), 1);
        assert_eq!(spec.assign(7.0), Some(0));
        assert_eq!(spec.assign(-100.0), Some(0));
    }

    #[test]
    fn test_uniform_equal_width() {
        let spec = BinSpec::fit("x", &[0.0, 10.0, 5.0, 2.5], 4, BinMethod::Uniform).unwrap();
        assert_eq!(spec.bin_count(), 4);
        assert!(spec.edges[0] < 0.0);
        assert_eq!(spec.assign(0.0), Some(0));
        assert_eq!(spec.assign(2.5), Some(0));
        assert_eq!(spec.assign(2.6), Some(1));
        assert_eq!(spec.assign(10.0), Some(3));
    }

    #[test]
    fn test_uniform_constant_column() {
        let spec = BinSpec::fit("x", &[4.0, 4.0], 3, BinMethod::Uniform).unwrap();
        assert_eq!(spec.bin_count(), 3);
        spec.validate().unwrap();
        assert_eq!(spec.assign(4.0), Some(1));
    }

    #[test]
    fn test_fit_ignores_nan_and_rejects_empty() {
        let spec = BinSpec::fit("x", &[f64::NAN, 1.0, 2.0, 3.0], 2, BinMethod::Quantile).unwrap();
        assert_eq!(spec.edges, vec![1.0, 2.0, 3.0]);
        assert!(BinSpec::fit("x", &[f64::NAN], 2, BinMethod::Quantile).is_err());
        assert!(BinSpec::fit("x", &[1.0], 0, BinMethod::Quantile).is_err());
    }

    #[test]
    fn test_binning_is_independent_of_batch_contents() {
        let spec = BinSpec::fit("x", &utilization_sample(), 5, BinMethod::Quantile).unwrap();
        let alone = spec.bin(&[0.42]);
        let in_batch = spec.bin(&[5.0, -3.0, 0.42, 0.1]);
        assert_eq!(alone[0], in_batch[2]);
    }

    #[test]
    fn test_validate_rejects_unsorted_edges() {
        let spec = BinSpec {
            column: "x".to_string(),
            method: BinMethod::Uniform,
            edges: vec![0.0, 2.0, 1.0],
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_bin_method_from_str() {
        assert_eq!("QUANTILE".parse::<BinMethod>().unwrap(), BinMethod::Quantile);
        assert_eq!("uniform".parse::<BinMethod>().unwrap(), BinMethod::Uniform);
        assert!("cart".parse::<BinMethod>().is_err());
    }
}
