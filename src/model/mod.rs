//! Scoring adapter boundary
//!
//! The pipeline treats the trained model as an opaque [`Classifier`]. The
//! bundled [`LogisticScorecard`] is one implementation loaded from a JSON
//! artifact.

mod scorecard;

pub use scorecard::*;

use serde::{Deserialize, Serialize};

use crate::pipeline::{FeatureManifest, ModelInput, PipelineError};

/// Label and optional probability for one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// A trained classifier. Implementations must be deterministic for a fixed
/// artifact and safe to share across worker threads.
pub trait Classifier: Send + Sync {
    /// Features the model was trained on, in order.
    fn features(&self) -> &[String];

    /// Score one model-ready row laid out in manifest order.
    fn predict(&self, input: &ModelInput, manifest: &FeatureManifest) -> Result<Prediction, PipelineError>;

    /// Check that the model consumes exactly the manifest's features.
    fn check_manifest(&self, manifest: &FeatureManifest) -> Result<(), PipelineError> {
        if self.features() != manifest.features() {
            let unknown: Vec<&str> = manifest
                .features()
                .iter()
                .filter(|f| !self.features().contains(f))
                .map(|f| f.as_str())
                .collect();
            return Err(PipelineError::Schema(format!(
                "model features do not match the feature manifest (manifest-only: [{}])",
                unknown.join(", ")
            )));
        }
        Ok(())
    }
}
