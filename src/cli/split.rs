//! `split`: stratified train/test split written next to the input

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::args::TargetValueArgs;
use super::fit::ensure_parent_dir;
use crate::pipeline::{
    count_target_classes, encode_target, load_dataset_with_progress, save_dataset,
    target_values, train_test_split,
};
use crate::utils::{
    print_banner, print_completion, print_config, print_info, print_saved, print_step_header,
};

pub struct SplitOptions<'a> {
    pub input: &'a Path,
    pub target: &'a str,
    pub test_size: f64,
    pub seed: u64,
    pub encode_target: bool,
    pub target_values: &'a TargetValueArgs,
    pub output_dir: Option<&'a Path>,
    pub infer_schema_length: usize,
}

/// `<dir>/<stem>_train.<ext>` and `<dir>/<stem>_test.<ext>`
pub fn split_output_paths(input: &Path, output_dir: Option<&Path>) -> (PathBuf, PathBuf) {
    let dir = output_dir
        .or_else(|| input.parent())
        .unwrap_or_else(|| Path::new("."));
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("data");
    let ext = input.extension().and_then(|e| e.to_str()).unwrap_or("csv");
    (
        dir.join(format!("{}_train.{}", stem, ext)),
        dir.join(format!("{}_test.{}", stem, ext)),
    )
}

pub fn run_split(opts: &SplitOptions) -> Result<()> {
    let (train_path, test_path) = split_output_paths(opts.input, opts.output_dir);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        "Train/test split",
        &[
            ("Input", opts.input.display().to_string()),
            ("Target", opts.target.to_string()),
            ("Test size", format!("{:.0}%", opts.test_size * 100.0)),
            ("Seed", opts.seed.to_string()),
            ("Encode target", opts.encode_target.to_string()),
        ],
    );

    print_step_header(1, "Load dataset");
    let (mut df, _, _, _) = load_dataset_with_progress(opts.input, opts.infer_schema_length)?;

    if opts.encode_target {
        let mapping = opts.target_values.mapping();
        df = encode_target(&df, opts.target, mapping.as_ref())?;
        let (events, non_events, ignored) =
            count_target_classes(&target_values(&df, opts.target, None)?);
        print_info(&format!(
            "Target encoded: {} events, {} non-events, {} unmapped",
            events, non_events, ignored
        ));
    }

    print_step_header(2, "Split");
    let (mut train, mut test) = train_test_split(&df, opts.target, opts.test_size, opts.seed)?;
    print_info(&format!("Train: {} rows, test: {} rows", train.height(), test.height()));

    print_step_header(3, "Save");
    ensure_parent_dir(&train_path)?;
    save_dataset(&mut train, &train_path)?;
    print_saved("Train set written to", &train_path);
    save_dataset(&mut test, &test_path)?;
    print_saved("Test set written to", &test_path);

    print_completion("Split complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_output_paths() {
        let (train, test) = split_output_paths(Path::new("data/credit.csv"), None);
        assert_eq!(train, PathBuf::from("data/credit_train.csv"));
        assert_eq!(test, PathBuf::from("data/credit_test.csv"));

        let (train, _) = split_output_paths(Path::new("credit.parquet"), Some(Path::new("out")));
        assert_eq!(train, PathBuf::from("out/credit_train.parquet"));
    }
}
