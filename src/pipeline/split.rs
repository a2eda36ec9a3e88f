//! Seeded, stratified train/test split

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Split `df` so each target class keeps its proportion in both halves.
///
/// Each class is shuffled with a `StdRng` seeded from `seed` and the first
/// `round(class_size * test_size)` rows go to the test set. Rows keep their
/// original relative order within each output. Null targets form their own
/// class.
pub fn train_test_split(
    df: &DataFrame,
    target: &str,
    test_size: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        anyhow::bail!("test_size must be in (0, 1), got {}", test_size);
    }

    let col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;
    let labels = col.cast(&DataType::String)?;

    let mut classes: BTreeMap<Option<String>, Vec<IdxSize>> = BTreeMap::new();
    for (idx, label) in labels.str()?.into_iter().enumerate() {
        classes
            .entry(label.map(|s| s.to_string()))
            .or_default()
            .push(idx as IdxSize);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(df.height());
    let mut test_idx = Vec::new();
    for (_, mut rows) in classes {
        rows.shuffle(&mut rng);
        let n_test = (rows.len() as f64 * test_size).round() as usize;
        test_idx.extend_from_slice(&rows[..n_test]);
        train_idx.extend_from_slice(&rows[n_test..]);
    }
    train_idx.sort_unstable();
    test_idx.sort_unstable();

    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx))?;

    tracing::debug!(train = train.height(), test = test.height(), seed, "split dataset");
    Ok((train, test))
}
