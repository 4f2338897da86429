//! Risk model capability
//!
//! The inference path treats the classifier as an opaque capability: a class
//! decision, a class-1 probability, and a global importance weight per
//! feature. Any classifier implementing [`RiskModel`] can be swapped in by
//! replacing the artifact file.
//!
//! The reference implementation is a random forest of CART trees persisted as
//! a JSON [`ModelArtifact`].

mod artifact;
mod forest;
mod tree;

pub use artifact::{ModelArtifact, TrainingSummary, ARTIFACT_FORMAT_VERSION};
pub use forest::{ForestParams, RandomForest};
pub use tree::{DecisionTree, Node, TreeParams};

use crate::features::{FEATURE_COUNT, FEATURE_LABELS, FEATURE_NAMES};
use crate::types::{FeatureImportance, FeatureVector};
use std::sync::Arc;

/// Trait for binary risk classifiers
pub trait RiskModel: Send + Sync {
    /// Class decision: 1 for high risk, 0 for low risk
    fn predict(&self, features: &FeatureVector) -> u8;

    /// Estimated probability of class 1
    fn predict_proba(&self, features: &FeatureVector) -> f64;

    /// Non-negative weights summing to 1, aligned with the feature schema
    fn feature_importances(&self) -> [f64; FEATURE_COUNT];
}

impl<M: RiskModel + ?Sized> RiskModel for Arc<M> {
    fn predict(&self, features: &FeatureVector) -> u8 {
        (**self).predict(features)
    }

    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        (**self).predict_proba(features)
    }

    fn feature_importances(&self) -> [f64; FEATURE_COUNT] {
        (**self).feature_importances()
    }
}

/// Feature importances as named entries, in schema order
pub fn named_importances<M: RiskModel + ?Sized>(model: &M) -> Vec<FeatureImportance> {
    model
        .feature_importances()
        .iter()
        .enumerate()
        .map(|(i, weight)| FeatureImportance {
            feature: FEATURE_NAMES[i].to_string(),
            label: FEATURE_LABELS[i].to_string(),
            weight: *weight,
        })
        .collect()
}

/// Feature importances sorted ascending by weight, as charted in analytics
pub fn ranked_importances<M: RiskModel + ?Sized>(model: &M) -> Vec<FeatureImportance> {
    let mut ranked = named_importances(model);
    ranked.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    ranked
}
