//! Scoring service: loads the manifest, fitted artifacts and model once and
//! serves single-record, list and batch-file predictions.

mod error;
mod response;

pub use error::*;
pub use response::*;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::{Classifier, LogisticScorecard};
use crate::pipeline::{
    get_column_names, load_dataset, records_from_dataframe, FeatureManifest, FeaturePipeline, PipelineArtifacts,
    PipelineError, Record,
};

/// Default directory holding the serving artifacts
pub const DEFAULT_MODEL_DIR: &str = "model";
pub const MANIFEST_FILE: &str = "selected_features.json";
pub const ARTIFACTS_FILE: &str = "transform_params.json";
pub const MODEL_FILE: &str = "scorecard.json";

/// Locations of the three startup artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServicePaths {
    pub manifest: PathBuf,
    pub artifacts: PathBuf,
    pub model: PathBuf,
}

impl ServicePaths {
    /// Standard file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            manifest: dir.join(MANIFEST_FILE),
            artifacts: dir.join(ARTIFACTS_FILE),
            model: dir.join(MODEL_FILE),
        }
    }
}

impl Default for ServicePaths {
    fn default() -> Self {
        Self::in_dir(Path::new(DEFAULT_MODEL_DIR))
    }
}

/// Accepted JSON prediction payloads
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictRequest {
    Wrapped(WrappedRequest),
    List(Vec<Record>),
    Single(Record),
}

/// `{"data": [...]}` with no other keys; an applicant that merely has a
/// `data` field falls through to `Single`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WrappedRequest {
    data: Vec<Record>,
}

/// Shared, read-only scoring service
#[derive(Clone)]
pub struct ScoringService {
    pipeline: Arc<FeaturePipeline>,
    model: Arc<dyn Classifier>,
    /// Reject rows with skipped transforms instead of scoring them
    strict: bool,
}

impl std::fmt::Debug for ScoringService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringService")
            .field("features", &self.pipeline.manifest().features())
            .finish()
    }
}

impl ScoringService {
    /// Load every artifact and validate them against each other. Any
    /// failure here is fatal.
    pub fn load(paths: &ServicePaths) -> Result<Self, PipelineError> {
        let manifest = FeatureManifest::load(&paths.manifest)?;
        let artifacts = PipelineArtifacts::load(&paths.artifacts)?;
        let model = LogisticScorecard::load(&paths.model)?;

        let service = Self::new(FeaturePipeline::new(artifacts, manifest)?, Arc::new(model))?;
        info!(
            features = service.schema().len(),
            required = service.pipeline.required_columns().len(),
            "scoring service ready"
        );
        Ok(service)
    }

    pub fn new(pipeline: FeaturePipeline, model: Arc<dyn Classifier>) -> Result<Self, PipelineError> {
        model.check_manifest(pipeline.manifest())?;
        Ok(Self {
            pipeline: Arc::new(pipeline),
            model,
            strict: false,
        })
    }

    /// In strict mode a row with any skipped transform fails instead of
    /// being scored with a warning.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Feature names the model consumes, in order
    pub fn schema(&self) -> &FeatureManifest {
        self.pipeline.manifest()
    }

    /// Raw columns a request row must carry
    pub fn required_columns(&self) -> &[String] {
        self.pipeline.required_columns()
    }

    /// Score a single record
    pub fn predict_one(&self, record: &Record) -> Result<SinglePrediction, ServiceError> {
        let mut prepared = self.pipeline.run_one(record)?;
        if self.strict && !prepared.flags.is_empty() {
            return Err(prepared.flags.swap_remove(0).into_error().into());
        }
        let prediction = self.model.predict(&prepared.input, self.pipeline.manifest())?;

        Ok(SinglePrediction {
            label: prediction.label,
            score: prediction.score,
            warnings: prepared.flags.iter().map(|f| f.to_string()).collect(),
        })
    }

    /// Score records independently; a failing row becomes an error entry
    /// and never affects its siblings.
    pub fn predict_records(&self, records: &[Record]) -> BatchResponse {
        let outcomes: Vec<Result<SinglePrediction, ServiceError>> =
            records.par_iter().map(|r| self.predict_one(r)).collect();

        let mut response = BatchResponse::default();
        for (row_index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(p) => response.predictions.push(RowPrediction {
                    row_index,
                    label: p.label,
                    score: p.score,
                    warnings: p.warnings,
                }),
                Err(e) => response.errors.push(RowError {
                    row_index,
                    message: e.to_string(),
                }),
            }
        }

        if !response.errors.is_empty() {
            warn!(
                rows = records.len(),
                failed = response.errors.len(),
                "batch finished with row errors"
            );
        }
        response
    }

    /// Handle a JSON request body: a single object, a list of objects, or
    /// `{"data": [...]}`.
    pub fn predict_json(&self, body: &str) -> Result<PredictResponse, ServiceError> {
        let request: PredictRequest = serde_json::from_str(body)
            .map_err(|e| ServiceError::Client(format!("malformed request body: {}", e)))?;

        match request {
            PredictRequest::Single(record) => self.predict_one(&record).map(PredictResponse::Single),
            PredictRequest::Wrapped(WrappedRequest { data: records }) | PredictRequest::List(records) => {
                Ok(PredictResponse::Batch(self.predict_records(&records)))
            }
        }
    }

    /// Score a delimited file with a header row.
    ///
    /// Only `.csv` is accepted. A file missing any required column is
    /// rejected as a whole, naming the missing columns; otherwise rows are
    /// scored independently.
    pub fn score_batch_file(&self, path: &Path) -> Result<BatchResponse, ServiceError> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(ServiceError::Client(format!(
                "unsupported file type for batch scoring: {} (expected a .csv file)",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(ServiceError::Client(format!(
                "batch file not found: {}",
                path.display()
            )));
        }

        // reject on the header alone before reading any rows
        let header = get_column_names(path)
            .map_err(|e| ServiceError::Client(format!("failed to parse {}: {:#}", path.display(), e)))?;
        let missing = self.pipeline.missing_columns(header.iter().map(|c| c.as_str()));
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns { missing }.into());
        }

        // full-file type inference; numeric text is coerced per cell anyway
        let df = load_dataset(path, None)
            .map_err(|e| ServiceError::Client(format!("failed to parse {}: {:#}", path.display(), e)))?;

        let records = records_from_dataframe(&df).map_err(|e| ServiceError::Server(format!("{:#}", e)))?;
        let response = self.predict_records(&records);
        info!(
            path = %path.display(),
            rows = records.len(),
            scored = response.predictions.len(),
            failed = response.errors.len(),
            "scored batch file"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureWeight, ScorecardTerm};
    use crate::pipeline::{BinMethod, BinSpec, SkewParams, SkewTransform, Value};
    use chrono::Utc;
    use std::io::Write;
    use tempfile::TempDir;

    fn service() -> ScoringService {
        let artifacts = PipelineArtifacts {
            format_version: 1,
            fitted_at: Utc::now(),
            input_columns: vec!["DTI_Ratio".to_string(), "Avg_Deposit_Balance".to_string()],
            binning: vec![BinSpec {
                column: "DTI_Ratio".to_string(),
                method: BinMethod::Uniform,
                edges: vec![0.0, 0.5, 1.0],
            }],
            skew: vec![SkewParams {
                column: "Avg_Deposit_Balance".to_string(),
                transform: SkewTransform::Log1p,
            }],
        };
        let manifest = FeatureManifest::new(vec![
            "DTI_Ratio_Bin".to_string(),
            "Avg_Deposit_Balance".to_string(),
        ])
        .unwrap();
        let model = LogisticScorecard::new(
            "test",
            0.0,
            vec![
                ScorecardTerm {
                    feature: "DTI_Ratio_Bin".to_string(),
                    weight: FeatureWeight::Coefficient(2.0),
                },
                ScorecardTerm {
                    feature: "Avg_Deposit_Balance".to_string(),
                    weight: FeatureWeight::Coefficient(-0.1),
                },
            ],
            0.5,
        )
        .unwrap();

        ScoringService::new(FeaturePipeline::new(artifacts, manifest).unwrap(), Arc::new(model)).unwrap()
    }

    fn write_file(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_predict_one() {
        let record: Record = [("DTI_Ratio", Value::Float(0.9)), ("Avg_Deposit_Balance", Value::Float(0.0))]
            .into_iter()
            .collect();
        let p = service().predict_one(&record).unwrap();

        assert_eq!(p.label, 1);
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn test_predict_one_missing_column_is_client_error() {
        let record: Record = [("DTI_Ratio", Value::Float(0.9))].into_iter().collect();
        let err = service().predict_one(&record).unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("Avg_Deposit_Balance"));
    }

    #[test]
    fn test_predict_json_shapes() {
        let svc = service();
        let one = svc
            .predict_json(r#"{"DTI_Ratio": 0.1, "Avg_Deposit_Balance": 10}"#)
            .unwrap();
        assert!(matches!(one, PredictResponse::Single(_)));

        let wrapped = svc
            .predict_json(r#"{"data": [{"DTI_Ratio": 0.1, "Avg_Deposit_Balance": 10}, {"DTI_Ratio": 0.7}]}"#)
            .unwrap();
        match wrapped {
            PredictResponse::Batch(b) => {
                assert_eq!(b.predictions.len(), 1);
                assert_eq!(b.errors[0].row_index, 1);
            }
            other => panic!("expected batch response, got {:?}", other),
        }

        let err = svc.predict_json("not json").unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_record_with_extra_keys_beside_data_is_not_a_batch() {
        let svc = service();
        let body = r#"{"data": [{"DTI_Ratio": 0.1, "Avg_Deposit_Balance": 10}], "DTI_Ratio": 0.9, "Avg_Deposit_Balance": 0}"#;

        let err = svc.predict_json(body).unwrap_err();
        assert!(err.is_client_error());

        // a scalar `data` field is just another column of a single record
        let one = svc
            .predict_json(r#"{"data": 5, "DTI_Ratio": 0.9, "Avg_Deposit_Balance": 0}"#)
            .unwrap();
        assert!(matches!(one, PredictResponse::Single(_)));
    }

    #[test]
    fn test_strict_mode_rejects_flagged_rows() {
        let record: Record = [("DTI_Ratio", Value::Float(0.2)), ("Avg_Deposit_Balance", Value::from("n/a"))]
            .into_iter()
            .collect();

        let err = service().with_strict(true).predict_one(&record).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().contains("Avg_Deposit_Balance"));
    }

    #[test]
    fn test_batch_rejects_non_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "applicants.txt", &["DTI_Ratio,Avg_Deposit_Balance", "0.1,5"]);

        let err = service().score_batch_file(&path).unwrap_err();
        assert!(matches!(err, ServiceError::Client(_)));
    }

    #[test]
    fn test_batch_missing_column_names_it() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "applicants.csv", &["Avg_Deposit_Balance", "5", "7"]);

        let err = service().score_batch_file(&path).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("DTI_Ratio"));
    }

    #[test]
    fn test_batch_partial_success() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "applicants.csv",
            &["DTI_Ratio,Avg_Deposit_Balance", "0.2,100", "oops,100", "0.8,n/a"],
        );

        let response = service().score_batch_file(&path).unwrap();
        assert_eq!(response.total_rows(), 3);
        assert_eq!(response.predictions.len(), 1);
        assert_eq!(response.predictions[0].row_index, 0);
        // row 1 has a null bin, row 2 keeps its raw "n/a" balance; the
        // model rejects both
        let failed: Vec<usize> = response.errors.iter().map(|e| e.row_index).collect();
        assert_eq!(failed, vec![1, 2]);
    }
}
