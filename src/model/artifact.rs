//! Persisted model artifact
//!
//! The artifact wraps a trained forest with the metadata needed to trust it:
//! a format version, the feature order it was trained on, and a summary of
//! the training run. Any failure to read or accept an artifact surfaces as
//! [`RiskError::ModelUnavailable`].

use super::forest::{ForestParams, RandomForest};
use super::RiskModel;
use crate::error::RiskError;
use crate::features::{schema_matches, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::FeatureVector;
use crate::{PRODUCER_NAME, RISK_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Current artifact format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Summary of the training run that produced an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Rows used for fitting
    pub rows: usize,
    /// Rows labeled high risk
    pub positives: usize,
    /// Fraction of training rows the fitted forest classifies correctly
    pub training_accuracy: f64,
    pub params: ForestParams,
}

/// Trained model plus provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    /// Producer name and version that wrote the artifact
    pub producer: String,
    /// Feature order the forest was trained on
    pub feature_names: Vec<String>,
    pub training: Option<TrainingSummary>,
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// Wrap a freshly trained forest
    pub fn new(forest: RandomForest, training: Option<TrainingSummary>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            producer: format!("{PRODUCER_NAME}/{RISK_VERSION}"),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            training,
            forest,
        }
    }

    /// Load and check an artifact from disk
    pub fn load(path: &Path) -> Result<Self, RiskError> {
        if !path.exists() {
            return Err(RiskError::model_unavailable(
                path,
                "artifact file not found; train a model first",
            ));
        }

        let json = fs::read_to_string(path).map_err(|e| RiskError::model_unavailable(path, e))?;
        let artifact = Self::from_json(&json, path)?;

        info!(
            model_id = %artifact.model_id,
            trees = artifact.forest.n_estimators(),
            path = %path.display(),
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Parse and check an artifact; `origin` is only used in error messages
    pub fn from_json(json: &str, origin: &Path) -> Result<Self, RiskError> {
        let artifact: Self =
            serde_json::from_str(json).map_err(|e| RiskError::model_unavailable(origin, e))?;
        artifact.check().map_err(|e| RiskError::model_unavailable(origin, e))?;
        Ok(artifact)
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, RiskError> {
        serde_json::to_string(self).map_err(RiskError::JsonError)
    }

    /// Write the artifact, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), RiskError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;

        info!(model_id = %self.model_id, path = %path.display(), "saved model artifact");
        Ok(())
    }

    fn check(&self) -> Result<(), String> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(format!(
                "unsupported artifact format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }
        if !schema_matches(&self.feature_names) {
            return Err(format!(
                "feature order {:?} does not match {:?}",
                self.feature_names, FEATURE_NAMES
            ));
        }
        self.forest.validate()
    }
}

impl RiskModel for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> u8 {
        self.forest.predict(features)
    }

    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        self.forest.predict_proba(features)
    }

    fn feature_importances(&self) -> [f64; FEATURE_COUNT] {
        self.forest.feature_importances()
    }
}
