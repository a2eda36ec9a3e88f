//! Dataset loader for CSV and Parquet files

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;

use crate::utils::{create_spinner, finish_with_success};

/// Rows scanned to infer CSV column types
pub const DEFAULT_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Supported tabular file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "parquet" => Ok(FileFormat::Parquet),
            _ => anyhow::bail!(
                "Unsupported file format: '{}'. Supported formats: csv, parquet",
                extension
            ),
        }
    }
}

/// Open a dataset lazily (CSV or Parquet based on extension)
pub fn scan_dataset(path: &Path, infer_schema_length: Option<usize>) -> Result<LazyFrame> {
    let lf = match FileFormat::from_path(path)? {
        FileFormat::Csv => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(infer_schema_length)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        FileFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
    };

    Ok(lf)
}

/// Load a dataset into memory
pub fn load_dataset(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame> {
    scan_dataset(path, infer_schema_length)?
        .collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))
}

/// Load a dataset behind a spinner, returning `(df, rows, cols, memory_mb)`.
/// An `infer_schema_length` of 0 scans the whole file.
pub fn load_dataset_with_progress(
    path: &Path,
    infer_schema_length: usize,
) -> Result<(DataFrame, usize, usize, f64)> {
    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let spinner = create_spinner(&format!("Loading {}", path.display()));
    let df = load_dataset(path, schema_length)?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    finish_with_success(
        &spinner,
        &format!("Loaded {} rows x {} columns ({:.2} MB)", rows, cols, memory_mb),
    );

    Ok((df, rows, cols, memory_mb))
}

/// Column names of a dataset without reading its rows
pub fn get_column_names(path: &Path) -> Result<Vec<String>> {
    let schema = scan_dataset(path, Some(DEFAULT_INFER_SCHEMA_LENGTH))?
        .collect_schema()
        .with_context(|| format!("Failed to read header of {}", path.display()))?;

    Ok(schema.iter_names().map(|s| s.to_string()).collect())
}

/// Write a DataFrame as CSV (with header)
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    Ok(())
}

/// Write a DataFrame to CSV or Parquet based on the output extension
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    match FileFormat::from_path(path)? {
        FileFormat::Csv => write_csv(df, path),
        FileFormat::Parquet => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            ParquetWriter::new(file)
                .finish(df)
                .with_context(|| format!("Failed to write Parquet file: {}", path.display()))?;
            Ok(())
        }
    }
}
