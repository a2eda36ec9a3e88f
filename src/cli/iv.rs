//! `iv`: rank features by Information Value and optionally write a manifest

use std::path::Path;

use anyhow::Result;

use super::args::{derived_path, TargetValueArgs};
use super::fit::ensure_parent_dir;
use crate::pipeline::{
    analyze_features_iv, candidate_features, load_dataset_with_progress, select_features_by_iv,
    BinMethod, FeatureManifest,
};
use crate::report::{display_iv_results, export_iv_analysis, ExportParams};
use crate::utils::{
    print_banner, print_completion, print_config, print_count, print_saved, print_step_header,
    print_warning,
};

pub struct IvOptions<'a> {
    pub input: &'a Path,
    pub target: &'a str,
    pub target_values: &'a TargetValueArgs,
    pub bins: usize,
    pub bin_method: BinMethod,
    pub threshold: f64,
    pub drop_columns: &'a [String],
    pub output: Option<&'a Path>,
    pub manifest_out: Option<&'a Path>,
    pub infer_schema_length: usize,
}

pub fn run_iv(opts: &IvOptions) -> Result<()> {
    let report_path = opts
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(opts.input, "_iv_analysis.json"));

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        "IV analysis",
        &[
            ("Input", opts.input.display().to_string()),
            ("Target", opts.target.to_string()),
            ("Binning", format!("{} x{}", opts.bin_method, opts.bins)),
            ("IV threshold", format!("{:.3}", opts.threshold)),
            ("Report", report_path.display().to_string()),
        ],
    );

    print_step_header(1, "Load dataset");
    let (df, _, _, _) = load_dataset_with_progress(opts.input, opts.infer_schema_length)?;
    if df.column(opts.target).is_err() {
        anyhow::bail!("Target column '{}' not found in {}", opts.target, opts.input.display());
    }

    let features: Vec<String> = candidate_features(&df, opts.target)
        .into_iter()
        .filter(|f| !opts.drop_columns.contains(f))
        .collect();

    print_step_header(2, "Information Value");
    let mapping = opts.target_values.mapping();
    let results = analyze_features_iv(
        &df,
        &features,
        opts.target,
        opts.bins,
        opts.bin_method,
        mapping.as_ref(),
    )?;
    let selected = select_features_by_iv(&results, opts.threshold);
    print_count(
        "features selected",
        selected.len(),
        Some(format!("(IV >= {})", opts.threshold).as_str()),
    );
    let failed = results.iter().filter(|r| r.iv.is_nan()).count();
    if failed > 0 {
        print_warning(&format!("IV could not be computed for {} feature(s)", failed));
    }
    display_iv_results(&results, opts.threshold);

    print_step_header(3, "Save");
    ensure_parent_dir(&report_path)?;
    export_iv_analysis(
        &results,
        &selected,
        &report_path,
        &ExportParams {
            input_file: &opts.input.display().to_string(),
            target_column: opts.target,
            bin_method: opts.bin_method,
            num_bins: opts.bins,
            iv_threshold: opts.threshold,
        },
    )?;
    print_saved("IV report written to", &report_path);

    if let Some(path) = opts.manifest_out {
        if selected.is_empty() {
            print_warning("No feature passed the threshold; manifest not written");
        } else {
            ensure_parent_dir(path)?;
            FeatureManifest::new(selected)?.save(path)?;
            print_saved("Feature manifest written to", path);
        }
    }

    print_completion("IV analysis complete!");
    Ok(())
}
