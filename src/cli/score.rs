//! `score`: batch-score a CSV file

use std::path::Path;

use anyhow::Result;

use super::args::derived_path;
use super::fit::ensure_parent_dir;
use crate::report::ScoringSummary;
use crate::service::{ScoringService, ServiceError, ServicePaths};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion, print_config,
    print_saved, print_step_header, print_warning,
};

pub fn run_score(
    input: &Path,
    paths: &ServicePaths,
    output: Option<&Path>,
    errors: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(input, "_predictions.csv"));
    let errors = errors
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(input, "_errors.json"));

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        "Batch scoring",
        &[
            ("Input", input.display().to_string()),
            ("Manifest", paths.manifest.display().to_string()),
            ("Artifacts", paths.artifacts.display().to_string()),
            ("Model", paths.model.display().to_string()),
            ("Predictions", output.display().to_string()),
            ("Strict", strict.to_string()),
        ],
    );

    print_step_header(1, "Load model artifacts");
    let spinner = create_spinner("Loading manifest, transform parameters and model...");
    let service = ScoringService::load(paths).map_err(ServiceError::from)?.with_strict(strict);
    finish_with_success(
        &spinner,
        &format!("Model expects {} features", service.schema().len()),
    );

    print_step_header(2, "Score rows");
    let spinner = create_spinner("Scoring...");
    let response = service.score_batch_file(input)?;
    let processed = format!("Processed {} rows", response.total_rows());
    if response.errors.is_empty() {
        finish_with_success(&spinner, &processed);
    } else {
        finish_with_warning(
            &spinner,
            &format!("{} ({} failed)", processed, response.errors.len()),
        );
    }

    print_step_header(3, "Save results");
    ensure_parent_dir(&output)?;
    response.write_predictions_csv(&output)?;
    print_saved("Predictions written to", &output);
    ensure_parent_dir(&errors)?;
    response.write_error_report(&errors)?;
    print_saved("Row errors written to", &errors);
    if !response.errors.is_empty() {
        print_warning(&format!(
            "{} row(s) could not be scored; see the error report",
            response.errors.len()
        ));
    }

    ScoringSummary::from_response(&response).display();
    print_completion("Scoring complete!");
    Ok(())
}
