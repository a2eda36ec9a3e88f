//! IV analysis export and terminal table

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::{BinMethod, FeatureType, IvResult, PredictivePower};

/// Metadata about the analysis run
#[derive(Debug, Serialize)]
pub struct AnalysisMetadata {
    /// Timestamp of the analysis (RFC 3339)
    pub timestamp: String,
    pub credscore_version: String,
    pub input_file: String,
    pub target_column: String,
    pub bin_method: String,
    pub num_bins: usize,
    pub iv_threshold: f64,
}

/// Summary statistics of the analysis
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub total_features_analyzed: usize,
    pub numeric_features: usize,
    pub categorical_features: usize,
    /// Features whose IV could not be computed
    pub failed_features: usize,
    pub features_selected: usize,
    /// Mean IV over features that were computed
    pub avg_iv: f64,
}

/// A single feature's analysis with its selection status
#[derive(Debug, Serialize)]
pub struct IvExportEntry {
    #[serde(flatten)]
    pub analysis: IvResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<PredictivePower>,
    pub selected: bool,
}

/// Complete IV analysis export with metadata
#[derive(Debug, Serialize)]
pub struct IvAnalysisExport {
    pub metadata: AnalysisMetadata,
    pub summary: AnalysisSummary,
    pub features: Vec<IvExportEntry>,
}

/// Parameters recorded in the export metadata
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub target_column: &'a str,
    pub bin_method: BinMethod,
    pub num_bins: usize,
    pub iv_threshold: f64,
}

/// Build the export document
pub fn build_iv_export(results: &[IvResult], selected: &[String], params: &ExportParams) -> IvAnalysisExport {
    let features: Vec<IvExportEntry> = results
        .iter()
        .map(|r| IvExportEntry {
            analysis: r.clone(),
            power: r.power(),
            selected: selected.contains(&r.feature),
        })
        .collect();

    let computed: Vec<f64> = results.iter().map(|r| r.iv).filter(|iv| !iv.is_nan()).collect();
    let avg_iv = if computed.is_empty() {
        0.0
    } else {
        computed.iter().sum::<f64>() / computed.len() as f64
    };

    IvAnalysisExport {
        metadata: AnalysisMetadata {
            timestamp: Utc::now().to_rfc3339(),
            credscore_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.to_string(),
            target_column: params.target_column.to_string(),
            bin_method: params.bin_method.to_string(),
            num_bins: params.num_bins,
            iv_threshold: params.iv_threshold,
        },
        summary: AnalysisSummary {
            total_features_analyzed: results.len(),
            numeric_features: results
                .iter()
                .filter(|r| r.feature_type == FeatureType::Numeric)
                .count(),
            categorical_features: results
                .iter()
                .filter(|r| r.feature_type == FeatureType::Categorical)
                .count(),
            failed_features: results.len() - computed.len(),
            features_selected: selected.len(),
            avg_iv,
        },
        features,
    }
}

/// Export IV analysis results to a JSON file
pub fn export_iv_analysis(
    results: &[IvResult],
    selected: &[String],
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = build_iv_export(results, selected, params);

    // serde_json writes NaN as null
    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize IV analysis to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write IV analysis to {}", output_path.display()))?;

    Ok(())
}

/// Print the ranked IV table
pub fn display_iv_results(results: &[IvResult], threshold: f64) {
    println!();
    println!(
        "    {} {}",
        style("📊").cyan(),
        style("INFORMATION VALUE").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Feature").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("IV").add_attribute(Attribute::Bold),
        Cell::new("Power").add_attribute(Attribute::Bold),
    ]);

    for r in results {
        let (iv_text, color) = if r.iv.is_nan() {
            ("n/a".to_string(), Color::DarkGrey)
        } else if r.iv >= threshold {
            (format!("{:.4}", r.iv), Color::Green)
        } else {
            (format!("{:.4}", r.iv), Color::Red)
        };
        let kind = match r.feature_type {
            FeatureType::Numeric => "numeric",
            FeatureType::Categorical => "categorical",
        };

        table.add_row(vec![
            Cell::new(&r.feature),
            Cell::new(kind),
            Cell::new(iv_text).fg(color),
            Cell::new(r.power().map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())),
        ]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn results() -> Vec<IvResult> {
        vec![
            IvResult { feature: "DTI_Ratio".into(), feature_type: FeatureType::Numeric, iv: 0.4, bins: vec![] },
            IvResult { feature: "Home_Owner".into(), feature_type: FeatureType::Categorical, iv: 0.01, bins: vec![] },
            IvResult { feature: "Broken".into(), feature_type: FeatureType::Numeric, iv: f64::NAN, bins: vec![] },
        ]
    }

    fn params() -> ExportParams<'static> {
        ExportParams {
            input_file: "train.csv",
            target_column: "Default_Flag",
            bin_method: BinMethod::Quantile,
            num_bins: 5,
            iv_threshold: 0.02,
        }
    }

    #[test]
    fn test_build_export_summary() {
        let export = build_iv_export(&results(), &["DTI_Ratio".to_string()], &params());

        assert_eq!(export.summary.total_features_analyzed, 3);
        assert_eq!(export.summary.categorical_features, 1);
        assert_eq!(export.summary.failed_features, 1);
        assert_eq!(export.summary.features_selected, 1);
        assert!((export.summary.avg_iv - 0.205).abs() < 1e-12);
        assert!(export.features[0].selected);
        assert!(!export.features[1].selected);
    }

    #[test]
    fn test_export_writes_json_with_null_for_nan() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("iv.json");
        export_iv_analysis(&results(), &["DTI_Ratio".to_string()], &path, &params()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["metadata"]["target_column"], "Default_Flag");
        assert_eq!(json["features"][0]["feature"], "DTI_Ratio");
        assert_eq!(json["features"][0]["power"], "strong");
        assert!(json["features"][2]["iv"].is_null());
    }
}
