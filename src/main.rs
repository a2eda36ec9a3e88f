//! credscore: credit decisioning feature pipeline CLI
//!
//! Subcommands fit the transform parameters, serve predictions from the
//! persisted artifacts and run the offline analysis helpers.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use credscore::cli::{
    run_eda, run_fit, run_iv, run_predict, run_schema, run_score, run_split, Cli, Commands,
    FitOverrides, IvOptions, SplitOptions,
};
use credscore::service::ServiceError;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        let code = match err.downcast_ref::<ServiceError>() {
            Some(service_err) => service_err.exit_code(),
            None => 1,
        };
        eprintln!("{} {:#}", style("error:").red().bold(), err);
        std::process::exit(code);
    }
}

/// Logs go to stderr so `predict` output on stdout stays machine-readable
fn init_tracing(verbose: bool) {
    let default = if verbose { "credscore=debug" } else { "credscore=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();

    let result = match &cli.command {
        Commands::Fit {
            input,
            config,
            output,
            bins,
            bin_method,
            skew_method,
            auto_skew,
            infer_schema_length,
        } => {
            let overrides = FitOverrides {
                bins: *bins,
                bin_method: *bin_method,
                skew_method: *skew_method,
                auto_skew: *auto_skew,
            };
            run_fit(input, config.as_deref(), output, &overrides, *infer_schema_length)
        }
        Commands::Predict {
            service,
            input,
            strict,
        } => run_predict(&service.paths(), input.as_deref(), *strict),
        Commands::Score {
            input,
            service,
            output,
            errors,
            strict,
        } => run_score(
            input,
            &service.paths(),
            output.as_deref(),
            errors.as_deref(),
            *strict,
        ),
        Commands::Schema {
            service,
            required,
            json,
        } => run_schema(&service.paths(), *required, *json),
        Commands::Iv {
            input,
            target,
            target_values,
            bins,
            bin_method,
            threshold,
            drop_columns,
            output,
            manifest_out,
            infer_schema_length,
        } => run_iv(&IvOptions {
            input,
            target,
            target_values,
            bins: *bins,
            bin_method: *bin_method,
            threshold: *threshold,
            drop_columns,
            output: output.as_deref(),
            manifest_out: manifest_out.as_deref(),
            infer_schema_length: *infer_schema_length,
        }),
        Commands::Eda {
            input,
            target,
            output,
            infer_schema_length,
        } => run_eda(
            input,
            target.as_deref(),
            output.as_deref(),
            *infer_schema_length,
        ),
        Commands::Split {
            input,
            target,
            test_size,
            seed,
            encode_target,
            target_values,
            output_dir,
            infer_schema_length,
        } => run_split(&SplitOptions {
            input,
            target,
            test_size: *test_size,
            seed: *seed,
            encode_target: *encode_target,
            target_values,
            output_dir: output_dir.as_deref(),
            infer_schema_length: *infer_schema_length,
        }),
    };

    tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "command finished");
    result
}
