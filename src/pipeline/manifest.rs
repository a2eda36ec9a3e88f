//! Feature manifest: the ordered column list the trained model expects.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::PipelineError;
use super::record::{Record, Value};

/// Ordered, duplicate-free list of model input columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureManifest {
    features: Vec<String>,
}

impl FeatureManifest {
    pub fn new(features: Vec<String>) -> Result<Self, PipelineError> {
        if features.is_empty() {
            return Err(PipelineError::Schema(
                "feature manifest must list at least one feature".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = features
            .iter()
            .filter(|f| !seen.insert(f.as_str()))
            .map(|f| f.as_str())
            .collect();
        if !duplicates.is_empty() {
            return Err(PipelineError::Schema(format!(
                "feature manifest lists duplicate feature(s): {}",
                duplicates.join(", ")
            )));
        }

        Ok(Self { features })
    }

    /// Load a manifest from a JSON array of feature names.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let artifact_err = |reason: String| PipelineError::Artifact {
            path: path.to_path_buf(),
            reason,
        };

        let text = std::fs::read_to_string(path).map_err(|e| artifact_err(e.to_string()))?;
        let manifest: Self =
            serde_json::from_str(&text).map_err(|e| artifact_err(e.to_string()))?;

        info!(path = %path.display(), features = manifest.len(), "loaded feature manifest");
        Ok(manifest)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize feature manifest")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write feature manifest to {}", path.display()))?;
        Ok(())
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f == name)
    }

    /// Manifest columns absent from `available`, in manifest order.
    pub fn missing_from<'a, I>(&self, available: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let available: HashSet<&str> = available.into_iter().collect();
        self.features
            .iter()
            .filter(|f| !available.contains(f.as_str()))
            .cloned()
            .collect()
    }

    /// Project a row onto the manifest, in manifest order.
    ///
    /// Extra columns are dropped. Any missing manifest column fails with
    /// [`PipelineError::MissingColumns`] naming every missing column.
    pub fn select(&self, record: &Record) -> Result<ModelInput, PipelineError> {
        let missing = self.missing_from(record.columns());
        if !missing.is_empty() {
            return Err(PipelineError::MissingColumns { missing });
        }

        let values = self
            .features
            .iter()
            .map(|f| record.get(f).cloned().unwrap_or(Value::Null))
            .collect();

        Ok(ModelInput { values })
    }
}

impl TryFrom<Vec<String>> for FeatureManifest {
    type Error = PipelineError;

    fn try_from(features: Vec<String>) -> Result<Self, Self::Error> {
        FeatureManifest::new(features)
    }
}

impl From<FeatureManifest> for Vec<String> {
    fn from(manifest: FeatureManifest) -> Self {
        manifest.features
    }
}

/// A model-ready row: values aligned with the manifest order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInput {
    values: Vec<Value>,
}

impl ModelInput {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Pair every value with its manifest feature name.
    pub fn named<'a>(&'a self, manifest: &'a FeatureManifest) -> impl Iterator<Item = (&'a str, &'a Value)> {
        manifest
            .features()
            .iter()
            .map(|s| s.as_str())
            .zip(self.values.iter())
    }

    /// Rebuild a record keyed by manifest names.
    pub fn to_record(&self, manifest: &FeatureManifest) -> Record {
        self.named(manifest)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest() -> FeatureManifest {
        FeatureManifest::new(vec![
            "Utilization_Ratio_Bin".to_string(),
            "Months_Oldest_Trade".to_string(),
            "Avg_Deposit_Balance".to_string(),
        ])
        .unwrap()
    }

    fn record() -> Record {
        [
            ("Avg_Deposit_Balance", Value::Float(0.3)),
            ("Utilization_Ratio", Value::Float(0.42)),
            ("Utilization_Ratio_Bin", Value::Int(2)),
            ("Months_Oldest_Trade", Value::Float(-1.1)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_select_orders_and_drops() {
        let input = manifest().select(&record()).unwrap();
        assert_eq!(
            input.values(),
            &[Value::Int(2), Value::Float(-1.1), Value::Float(0.3)]
        );
    }

    #[test]
    fn test_select_missing_names_all_columns() {
        let mut partial = Record::new();
        partial.insert("Months_Oldest_Trade", 4.0);

        let err = manifest().select(&partial).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingColumns {
                missing: vec![
                    "Utilization_Ratio_Bin".to_string(),
                    "Avg_Deposit_Balance".to_string()
                ]
            }
        );
    }

    #[test]
    fn test_select_is_idempotent() {
        let m = manifest();
        let once = m.select(&record()).unwrap();
        let twice = m.select(&once.to_record(&m)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(FeatureManifest::new(vec![]).is_err());
        let err = FeatureManifest::new(vec!["a".to_string(), "b".to_string(), "a".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("selected_features.json");
        manifest().save(&path).unwrap();

        let loaded = FeatureManifest::load(&path).unwrap();
        assert_eq!(loaded, manifest());
    }

    #[test]
    fn test_load_missing_file_is_artifact_error() {
        let err = FeatureManifest::load(Path::new("/nonexistent/selected_features.json")).unwrap_err();
        assert!(matches!(err, PipelineError::Artifact { .. }));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"features": "nope"}"#).unwrap();
        assert!(FeatureManifest::load(&path).is_err());
    }
}
