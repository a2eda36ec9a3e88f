//! `eda`: exploratory summary

use std::path::Path;

use anyhow::Result;

use super::fit::ensure_parent_dir;
use crate::pipeline::{load_dataset_with_progress, run_eda_summary};
use crate::report::display_eda_summary;
use crate::utils::{create_spinner, finish_with_success, print_banner, print_saved};

pub fn run_eda(
    input: &Path,
    target: Option<&str>,
    output: Option<&Path>,
    infer_schema_length: usize,
) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"));

    let (df, _, _, _) = load_dataset_with_progress(input, infer_schema_length)?;
    let spinner = create_spinner("Summarizing...");
    let summary = run_eda_summary(&df, target)?;
    finish_with_success(&spinner, "Summary ready");

    display_eda_summary(&summary);

    if let Some(path) = output {
        ensure_parent_dir(path)?;
        summary.save_json(path)?;
        println!();
        print_saved("Summary written to", path);
    }
    println!();
    Ok(())
}
