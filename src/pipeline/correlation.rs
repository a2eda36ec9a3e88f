//! Pearson correlation between numeric columns

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::stats::pearson;

/// Represents a correlated pair of features
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Symmetric correlation matrix; `None` where a coefficient is undefined
/// (constant column or fewer than two complete pairs)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }

    /// Pairs with `|r| > threshold`, strongest first
    pub fn pairs_above(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.columns.len();
        let mut pairs: Vec<CorrelatedPair> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .filter_map(|(i, j)| {
                self.values[i][j]
                    .filter(|c| c.abs() > threshold)
                    .map(|c| CorrelatedPair {
                        feature1: self.columns[i].clone(),
                        feature2: self.columns[j].clone(),
                        correlation: c,
                    })
            })
            .collect();

        pairs.sort_by(|a, b| {
            b.correlation
                .abs()
                .partial_cmp(&a.correlation.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pairs
    }
}

/// Pairwise Pearson correlation over all numeric columns, computed in
/// parallel over the upper triangle. Nulls are dropped pairwise.
pub fn correlation_matrix(df: &DataFrame, show_progress: bool) -> Result<CorrelationMatrix> {
    let mut columns = Vec::new();
    let mut data: Vec<Vec<Option<f64>>> = Vec::new();
    for col in df.get_columns() {
        if !col.dtype().is_primitive_numeric() {
            continue;
        }
        let float_col = col.cast(&DataType::Float64)?;
        data.push(float_col.f64()?.into_iter().collect());
        columns.push(col.name().to_string());
    }

    let n = columns.len();
    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let pb = if show_progress {
        let pb = ProgressBar::new(pairs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "   Calculating correlations [{bar:40.cyan/blue}] {pos}/{len} pairs ({percent}%) [{eta}]",
                )
                .map_err(|e| anyhow::anyhow!("Invalid progress template: {}", e))?
                .progress_chars("=>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let coefficients: Vec<((usize, usize), Option<f64>)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let r = pearson(&data[i], &data[j]);
            pb.inc(1);
            ((i, j), r)
        })
        .collect();
    pb.finish_and_clear();

    let mut values = vec![vec![None; n]; n];
    for (i, row) in values.iter_mut().enumerate() {
        // a column with any variance correlates perfectly with itself
        row[i] = pearson(&data[i], &data[i]).map(|_| 1.0);
    }
    for ((i, j), r) in coefficients {
        values[i][j] = r;
        values[j][i] = r;
    }

    Ok(CorrelationMatrix { columns, values })
}
