//! Logistic scorecard: a linear model over manifest features with a
//! sigmoid link and a decision threshold.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Classifier, Prediction};
use crate::pipeline::{FeatureManifest, ModelInput, PipelineError, Value};

/// Default probability cut-off for the positive label
pub const DEFAULT_THRESHOLD: f64 = 0.5;

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// Model term for one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureWeight {
    /// Numeric coefficient
    Coefficient(f64),
    /// Per-level weights for a categorical feature; unseen levels use
    /// `default`
    Levels {
        levels: BTreeMap<String, f64>,
        #[serde(default)]
        default: f64,
    },
}

/// One `(feature, weight)` entry; kept as a list so order is explicit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorecardTerm {
    pub feature: String,
    pub weight: FeatureWeight,
}

/// Serialized scorecard artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticScorecard {
    pub name: String,
    pub intercept: f64,
    pub terms: Vec<ScorecardTerm>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(skip)]
    features: Vec<String>,
}

impl LogisticScorecard {
    pub fn new(name: &str, intercept: f64, terms: Vec<ScorecardTerm>, threshold: f64) -> Result<Self, PipelineError> {
        let mut card = Self {
            name: name.to_string(),
            intercept,
            terms,
            threshold,
            features: Vec::new(),
        };
        card.finish()?;
        Ok(card)
    }

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let artifact_err = |reason: String| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| artifact_err(e.to_string()))?;
        let mut card: Self =
            serde_json::from_str(&text).map_err(|e| artifact_err(e.to_string()))?;
        card.finish().map_err(|e| artifact_err(e.to_string()))?;

        info!(path = %path.display(), model = %card.name, terms = card.terms.len(), "loaded scorecard");
        Ok(card)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let json = serde_json::to_string_pretty(self).context("Failed to serialize scorecard")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write scorecard to {}", path.display()))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::Schema(format!(
                "scorecard threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if !self.intercept.is_finite() {
            return Err(PipelineError::Schema("scorecard intercept must be finite".to_string()));
        }
        for term in &mut self.terms {
            if let FeatureWeight::Levels { levels, .. } = &mut term.weight {
                // artifact keys like "1.0" must match row cells keyed as "1"
                *levels = std::mem::take(levels)
                    .into_iter()
                    .map(|(k, w)| (Value::Text(k.clone()).level_key().unwrap_or(k), w))
                    .collect();
            }
        }
        self.features = self.terms.iter().map(|t| t.feature.clone()).collect();
        Ok(())
    }

    /// Linear predictor (log-odds) for a row
    fn log_odds(&self, input: &ModelInput, manifest: &FeatureManifest) -> Result<f64, PipelineError> {
        let mut z = self.intercept;

        for (term, (name, value)) in self.terms.iter().zip(input.named(manifest)) {
            if term.feature != name {
                return Err(PipelineError::UpstreamModel(format!(
                    "input column '{}' does not match model feature '{}'",
                    name, term.feature
                )));
            }

            z += match &term.weight {
                FeatureWeight::Coefficient(beta) => {
                    let x = value.as_f64().ok_or_else(|| {
                        PipelineError::UpstreamModel(format!(
                            "feature '{}' needs a numeric value, got {}",
                            name,
                            value.describe()
                        ))
                    })?;
                    beta * x
                }
                FeatureWeight::Levels { levels, default } => {
                    let level = value.level_key().ok_or_else(|| {
                        PipelineError::UpstreamModel(format!("feature '{}' is null", name))
                    })?;
                    levels.get(&level).copied().unwrap_or(*default)
                }
            };
        }

        if !z.is_finite() {
            return Err(PipelineError::UpstreamModel(
                "linear predictor is not finite".to_string(),
            ));
        }
        Ok(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticScorecard {
    fn features(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, input: &ModelInput, manifest: &FeatureManifest) -> Result<Prediction, PipelineError> {
        if input.values().len() != self.terms.len() {
            return Err(PipelineError::UpstreamModel(format!(
                "expected {} features, got {}",
                self.terms.len(),
                input.values().len()
            )));
        }

        let score = sigmoid(self.log_odds(input, manifest)?);
        Ok(Prediction {
            label: i64::from(score >= self.threshold),
            score: Some(score),
        })
    }
}
