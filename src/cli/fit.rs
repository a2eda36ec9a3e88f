//! `fit`: learn bin edges and skew parameters from a training file

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Table};

use crate::pipeline::{
    fit_artifacts, load_dataset_with_progress, BinMethod, PipelineConfig, SkewMethod,
    SkewSelection, SkewTransform,
};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_saved, print_step_header, print_success,
};

/// Command-line overrides applied on top of the config file
#[derive(Debug, Clone, Default)]
pub struct FitOverrides {
    pub bins: Option<usize>,
    pub bin_method: Option<BinMethod>,
    pub skew_method: Option<SkewMethod>,
    pub auto_skew: bool,
}

impl FitOverrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(bins) = self.bins {
            config.bins = bins;
        }
        if let Some(method) = self.bin_method {
            config.bin_method = method;
        }
        if let Some(method) = self.skew_method {
            config.skew_method = method;
        }
        if self.auto_skew {
            config.skew_columns = SkewSelection::auto();
        }
    }
}

pub fn run_fit(
    input: &Path,
    config_path: Option<&Path>,
    output: &Path,
    overrides: &FitOverrides,
    infer_schema_length: usize,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;

    print_banner(env!("CARGO_PKG_VERSION"));
    let skew_columns = match &config.skew_columns {
        SkewSelection::Columns(columns) => columns.join(", "),
        SkewSelection::Auto { threshold, .. } => format!("auto (|skew| >= {})", threshold),
    };
    print_config(
        "Fit configuration",
        &[
            ("Input", input.display().to_string()),
            ("Output", output.display().to_string()),
            ("Binning", format!("{} x{}", config.bin_method, config.bins)),
            ("Bin columns", config.bin_columns.join(", ")),
            ("Skew", config.skew_method.to_string()),
            ("Skew columns", skew_columns),
        ],
    );

    print_step_header(1, "Load training data");
    let (df, _, _, _) = load_dataset_with_progress(input, infer_schema_length)?;

    print_step_header(2, "Fit transforms");
    let spinner = create_spinner("Fitting bin edges and skew parameters...");
    let artifacts = fit_artifacts(&df, &config)?;
    finish_with_success(
        &spinner,
        &format!(
            "Fitted {} binned and {} skew-corrected columns",
            artifacts.binning.len(),
            artifacts.skew.len()
        ),
    );

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Transform").add_attribute(Attribute::Bold),
        Cell::new("Parameters").add_attribute(Attribute::Bold),
    ]);
    for spec in &artifacts.binning {
        let edges: Vec<String> = spec.edges.iter().map(|e| format!("{:.4}", e)).collect();
        table.add_row(vec![
            Cell::new(&spec.column),
            Cell::new(format!("{} bins -> {}", spec.bin_count(), spec.output_column())),
            Cell::new(edges.join(" | ")),
        ]);
    }
    for params in &artifacts.skew {
        let detail = match &params.transform {
            SkewTransform::YeoJohnson { lambda, mean, std } => {
                format!("lambda={:.4} mean={:.4} std={:.4}", lambda, mean, std)
            }
            SkewTransform::Log1p => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(&params.column),
            Cell::new(params.method().to_string()),
            Cell::new(detail),
        ]);
    }
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
    print_success(&format!(
        "{} input columns declared",
        artifacts.input_columns.len()
    ));

    print_step_header(3, "Save");
    ensure_parent_dir(output)?;
    artifacts.save(output)?;
    print_saved("Transform parameters written to", output);

    print_completion("Fit complete!");
    Ok(())
}

/// Create the parent directory of an output file if needed
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let mut config = PipelineConfig::default();
        FitOverrides {
            bins: Some(10),
            bin_method: Some(BinMethod::Uniform),
            skew_method: None,
            auto_skew: true,
        }
        .apply(&mut config);

        assert_eq!(config.bins, 10);
        assert_eq!(config.bin_method, BinMethod::Uniform);
        assert_eq!(config.skew_method, SkewMethod::YeoJohnson);
        assert!(matches!(config.skew_columns, SkewSelection::Auto { .. }));
    }
}
