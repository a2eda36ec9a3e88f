//! Shared test utilities and fixture generators

#![allow(dead_code)]

use chrono::Utc;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use credscore::model::{FeatureWeight, LogisticScorecard, ScorecardTerm};
use credscore::pipeline::{
    BinMethod, BinSpec, FeatureManifest, PipelineArtifacts, Record, SkewParams, SkewTransform,
    Value,
};
use credscore::service::{ServicePaths, ARTIFACTS_FILE, MANIFEST_FILE, MODEL_FILE};

/// Features the fixture scorecard is trained on, in manifest order
pub const FIXTURE_FEATURES: [&str; 4] = [
    "Utilization_Ratio_Bin",
    "DTI_Ratio_Bin",
    "Avg_Deposit_Balance",
    "Home_Owner",
];

/// Deterministic training extract shaped like a credit bureau pull.
///
/// - `Applicant_Id`: identifier, never a feature
/// - `Utilization_Ratio`, `DTI_Ratio`: drive the default flag
/// - `Avg_Deposit_Balance`: strongly right-skewed
/// - `Income`: weakly related, with two missing values
/// - `Home_Owner`: 0/1 flag
/// - `Default_Flag`: 1 in a fifth of rows, concentrated at high utilization
pub fn create_training_dataframe() -> DataFrame {
    let n = 100;
    let util: Vec<f64> = (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect();
    let dti: Vec<f64> = (0..n).map(|i| ((i * 37) % n) as f64 / n as f64).collect();
    let balance: Vec<f64> = (0..n).map(|i| ((i % 20) as f64).powi(3) * 10.0).collect();
    let income: Vec<Option<f64>> = (0..n)
        .map(|i| if i % 50 == 7 { None } else { Some(30_000.0 + (i * 913 % 70) as f64 * 1_000.0) })
        .collect();
    let months: Vec<f64> = (0..n).map(|i| ((i % 10) as f64).exp()).collect();
    let home_owner: Vec<i32> = (0..n).map(|i| i32::from(i % 3 == 0)).collect();
    let default_flag: Vec<i32> = (0..n)
        .map(|i| i32::from((i >= 70 && i % 3 != 0) || i == 10 || i == 30))
        .collect();
    let ids: Vec<String> = (0..n).map(|i| format!("A-{:04}", i)).collect();

    df! {
        "Applicant_Id" => ids,
        "Utilization_Ratio" => util,
        "DTI_Ratio" => dti,
        "Avg_Deposit_Balance" => balance,
        "Income" => income,
        "Months_Oldest_Trade" => months,
        "Home_Owner" => home_owner,
        "Default_Flag" => default_flag,
    }
    .unwrap()
}

/// Hand-fitted artifacts with round edges so expected bins are obvious
pub fn fixture_artifacts() -> PipelineArtifacts {
    PipelineArtifacts {
        format_version: 1,
        fitted_at: Utc::now(),
        input_columns: vec![
            "Utilization_Ratio".to_string(),
            "DTI_Ratio".to_string(),
            "Avg_Deposit_Balance".to_string(),
            "Home_Owner".to_string(),
        ],
        binning: vec![
            BinSpec {
                column: "Utilization_Ratio".to_string(),
                method: BinMethod::Quantile,
                edges: vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0],
            },
            BinSpec {
                column: "DTI_Ratio".to_string(),
                method: BinMethod::Uniform,
                edges: vec![0.0, 0.25, 0.5, 0.75, 1.0],
            },
        ],
        skew: vec![SkewParams {
            column: "Avg_Deposit_Balance".to_string(),
            transform: SkewTransform::Log1p,
        }],
    }
}

pub fn fixture_manifest() -> FeatureManifest {
    FeatureManifest::new(FIXTURE_FEATURES.iter().map(|s| s.to_string()).collect()).unwrap()
}

pub fn fixture_scorecard() -> LogisticScorecard {
    let terms = [
        ("Utilization_Ratio_Bin", 0.6),
        ("DTI_Ratio_Bin", 0.3),
        ("Avg_Deposit_Balance", -0.1),
        ("Home_Owner", -0.4),
    ]
    .into_iter()
    .map(|(feature, coef)| ScorecardTerm {
        feature: feature.to_string(),
        weight: FeatureWeight::Coefficient(coef),
    })
    .collect();

    LogisticScorecard::new("fixture", -2.0, terms, 0.5).unwrap()
}

/// Write manifest, artifacts and scorecard into `dir` under their default names
pub fn write_model_dir(dir: &Path) -> ServicePaths {
    let paths = ServicePaths::in_dir(dir);
    fixture_manifest().save(&paths.manifest).unwrap();
    fixture_artifacts().save(&paths.artifacts).unwrap();
    fixture_scorecard().save(&paths.model).unwrap();

    assert!(dir.join(MANIFEST_FILE).exists());
    assert!(dir.join(ARTIFACTS_FILE).exists());
    assert!(dir.join(MODEL_FILE).exists());
    paths
}

/// A temp model directory populated with the fixture artifacts
pub fn create_model_dir() -> (TempDir, ServicePaths) {
    let temp_dir = TempDir::new().unwrap();
    let paths = write_model_dir(temp_dir.path());
    (temp_dir, paths)
}

/// One applicant row for the fixture pipeline
pub fn applicant(util: f64, dti: f64, balance: f64, home_owner: i64) -> Record {
    [
        ("Applicant_Id", Value::from("A-9999")),
        ("Utilization_Ratio", Value::Float(util)),
        ("DTI_Ratio", Value::Float(dti)),
        ("Avg_Deposit_Balance", Value::Float(balance)),
        ("Home_Owner", Value::Int(home_owner)),
    ]
    .into_iter()
    .collect()
}

/// A spread of applicants covering every bin
pub fn applicants(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let util = (i % 10) as f64 / 10.0 + 0.05;
            let dti = ((i * 7) % 10) as f64 / 10.0;
            let balance = (i * 131 % 5_000) as f64;
            applicant(util, dti, balance, (i % 2) as i64)
        })
        .collect()
}

/// Write raw CSV lines into `dir/name`
pub fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has the expected columns
pub fn assert_has_columns(df: &DataFrame, expected: &[&str]) {
    let cols: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    for exp in expected {
        assert!(
            cols.contains(&exp.to_string()),
            "Expected column '{}' not found in {:?}",
            exp,
            cols
        );
    }
}
