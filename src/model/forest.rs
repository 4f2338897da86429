//! Random forest classifier
//!
//! Bagged CART trees with per-split feature subsampling. The probability is
//! the mean of the trees' leaf probabilities; the class decision is 1 when
//! that mean is strictly above 0.5. Training is fully determined by the seed.

use super::tree::{DecisionTree, TreeParams};
use super::RiskModel;
use crate::error::RiskError;
use crate::features::FEATURE_COUNT;
use crate::types::FeatureVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of trees
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default training seed
pub const DEFAULT_SEED: u64 = 42;

/// Forest training parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; defaults to floor(sqrt(feature count))
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            seed: DEFAULT_SEED,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        let sqrt_features = (FEATURE_COUNT as f64).sqrt().floor() as usize;
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features.unwrap_or(sqrt_features).max(1),
        }
    }
}

/// Ensemble of decision trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Wrap existing trees, checking each one
    pub fn from_trees(trees: Vec<DecisionTree>) -> Result<Self, String> {
        let forest = Self { trees };
        forest.validate()?;
        Ok(forest)
    }

    /// Fit a forest on encoded feature vectors and 0/1 labels
    pub fn fit(
        features: &[FeatureVector],
        labels: &[u8],
        params: &ForestParams,
    ) -> Result<Self, RiskError> {
        if features.is_empty() {
            return Err(RiskError::Training("no training rows".to_string()));
        }
        if features.len() != labels.len() {
            return Err(RiskError::Training(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if labels.iter().any(|&l| l > 1) {
            return Err(RiskError::Training("labels must be 0 or 1".to_string()));
        }
        if params.n_estimators == 0 {
            return Err(RiskError::Training("n_estimators must be at least 1".to_string()));
        }

        let tree_params = params.tree_params();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = features.len();

        let trees = (0..params.n_estimators)
            .map(|i| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let samples: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| tree_rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                let tree =
                    DecisionTree::fit(features, labels, samples, &tree_params, &mut tree_rng);
                debug!(tree = i, nodes = tree.nodes().len(), "grew tree");
                tree
            })
            .collect();

        Ok(Self { trees })
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }
}

impl RiskModel for RandomForest {
    fn predict(&self, features: &FeatureVector) -> u8 {
        if self.predict_proba(features) > 0.5 {
            1
        } else {
            0
        }
    }

    fn predict_proba(&self, features: &FeatureVector) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        sum / self.trees.len() as f64
    }

    fn feature_importances(&self) -> [f64; FEATURE_COUNT] {
        let mut totals = [0.0; FEATURE_COUNT];

        for tree in &self.trees {
            let raw = tree.raw_importances();
            let tree_sum: f64 = raw.iter().sum();
            if tree_sum > 0.0 {
                for (total, value) in totals.iter_mut().zip(raw.iter()) {
                    *total += value / tree_sum;
                }
            }
        }

        let grand_total: f64 = totals.iter().sum();
        if grand_total > 0.0 {
            totals.iter_mut().for_each(|t| *t /= grand_total);
            totals
        } else {
            // No tree ever split: nothing distinguishes the features
            [1.0 / FEATURE_COUNT as f64; FEATURE_COUNT]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn vector(age: f64, whtr: f64, sitting: f64) -> FeatureVector {
        FeatureVector([age, 1.0, 23.0, whtr * 170.0, whtr, sitting, 1.0])
    }

    /// Synthetic screening data where central adiposity and sitting drive risk
    fn synthetic_dataset() -> (Vec<FeatureVector>, Vec<u8>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let age = 25.0 + (i % 30) as f64;
            let whtr = 0.40 + (i % 20) as f64 * 0.01;
            let sitting = (i % 3) as f64;
            let label = u8::from(whtr >= 0.5 || (whtr >= 0.47 && sitting == 2.0));
            features.push(vector(age, whtr, sitting));
            labels.push(label);
        }
        (features, labels)
    }

    fn leaf(probability: f64) -> Node {
        Node::Leaf {
            probability,
            samples: 10,
        }
    }

    fn split(feature: usize, threshold: f64, impurity_decrease: f64) -> Node {
        Node::Split {
            feature,
            threshold,
            left: 1,
            right: 2,
            impurity_decrease,
        }
    }

    #[test]
    fn test_probability_is_tree_mean() {
        let forest = RandomForest::from_trees(vec![
            DecisionTree::from_nodes(vec![split(4, 0.5, 4.0), leaf(0.0), leaf(1.0)]).unwrap(),
            DecisionTree::from_nodes(vec![split(5, 1.5, 2.0), leaf(0.2), leaf(0.6)]).unwrap(),
        ])
        .unwrap();

        let high = vector(40.0, 0.56, 2.0);
        assert!((forest.predict_proba(&high) - 0.8).abs() < 1e-12);
        assert_eq!(forest.predict(&high), 1);

        // 0.0 and 0.6 average to 0.3
        let low = vector(40.0, 0.45, 2.0);
        assert!((forest.predict_proba(&low) - 0.3).abs() < 1e-12);
        assert_eq!(forest.predict(&low), 0);
    }

    #[test]
    fn test_exact_half_is_low_class() {
        let forest = RandomForest::from_trees(vec![
            DecisionTree::from_nodes(vec![leaf(0.0)]).unwrap(),
            DecisionTree::from_nodes(vec![leaf(1.0)]).unwrap(),
        ])
        .unwrap();

        let v = vector(40.0, 0.5, 1.0);
        assert_eq!(forest.predict_proba(&v), 0.5);
        assert_eq!(forest.predict(&v), 0);
    }

    #[test]
    fn test_importances_normalized_per_tree() {
        let forest = RandomForest::from_trees(vec![
            DecisionTree::from_nodes(vec![split(4, 0.5, 30.0), leaf(0.0), leaf(1.0)]).unwrap(),
            DecisionTree::from_nodes(vec![split(5, 1.5, 1.0), leaf(0.0), leaf(1.0)]).unwrap(),
        ])
        .unwrap();

        let importances = forest.feature_importances();
        assert!((importances[4] - 0.5).abs() < 1e-12);
        assert!((importances[5] - 0.5).abs() < 1e-12);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unsplit_forest_reports_uniform_importances() {
        let forest =
            RandomForest::from_trees(vec![DecisionTree::from_nodes(vec![leaf(1.0)]).unwrap()])
                .unwrap();

        let importances = forest.feature_importances();
        assert!(importances
            .iter()
            .all(|&w| (w - 1.0 / FEATURE_COUNT as f64).abs() < 1e-12));
    }

    #[test]
    fn test_fit_learns_synthetic_signal() {
        let (features, labels) = synthetic_dataset();
        let params = ForestParams {
            n_estimators: 25,
            ..ForestParams::default()
        };

        let forest = RandomForest::fit(&features, &labels, &params).unwrap();
        assert_eq!(forest.n_estimators(), 25);
        assert!(forest.validate().is_ok());

        let correct = features
            .iter()
            .zip(labels.iter())
            .filter(|(f, &l)| forest.predict(f) == l)
            .count();
        assert!(correct as f64 / features.len() as f64 > 0.9);

        let importances = forest.feature_importances();
        assert_eq!(importances.len(), FEATURE_COUNT);
        assert!(importances.iter().all(|&w| w >= 0.0));
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_is_reproducible_for_seed() {
        let (features, labels) = synthetic_dataset();
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };

        let first = RandomForest::fit(&features, &labels, &params).unwrap();
        let second = RandomForest::fit(&features, &labels, &params).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (features, labels) = synthetic_dataset();

        assert!(RandomForest::fit(&[], &[], &ForestParams::default()).is_err());
        assert!(RandomForest::fit(&features, &labels[..10], &ForestParams::default()).is_err());

        let params = ForestParams {
            n_estimators: 0,
            ..ForestParams::default()
        };
        assert!(RandomForest::fit(&features, &labels, &params).is_err());

        let mut bad_labels = labels.clone();
        bad_labels[0] = 2;
        assert!(RandomForest::fit(&features, &bad_labels, &ForestParams::default()).is_err());
    }

    #[test]
    fn test_empty_forest_rejected() {
        assert!(RandomForest::from_trees(Vec::new()).is_err());
    }
}
