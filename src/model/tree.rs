//! CART decision tree for binary classification
//!
//! Trees are stored as a flat node arena. Node 0 is the root and every child
//! index is strictly greater than its parent's, so traversal always
//! terminates. Samples with `x[feature] <= threshold` go left.

use crate::features::FEATURE_COUNT;
use crate::types::FeatureVector;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Smallest impurity decrease that still counts as a split
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Sample-weighted Gini decrease achieved by this split
        impurity_decrease: f64,
    },
    Leaf {
        /// Fraction of class-1 training samples that reached this leaf
        probability: f64,
        samples: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split
    pub max_features: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: FEATURE_COUNT,
        }
    }
}

/// Binary classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Training rows borrowed by the builder
struct TrainingView<'a> {
    features: &'a [FeatureVector],
    labels: &'a [u8],
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity_decrease: f64,
}

impl DecisionTree {
    /// Build a tree from an explicit node list, checking its structure
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, String> {
        let tree = Self { nodes };
        tree.validate()?;
        Ok(tree)
    }

    /// Grow a tree on the given sample indices (duplicates allowed)
    pub fn fit<R: Rng + ?Sized>(
        features: &[FeatureVector],
        labels: &[u8],
        mut samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let view = TrainingView { features, labels };
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(&view, &mut samples, 0, params, rng);
        tree
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of split nodes
    pub fn split_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Split { .. }))
            .count()
    }

    /// Check node indices, features and leaf probabilities
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    impurity_decrease,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!("node {idx}: feature index {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx}: threshold is not finite"));
                    }
                    if !impurity_decrease.is_finite() || *impurity_decrease < 0.0 {
                        return Err(format!(
                            "node {idx}: invalid impurity decrease {impurity_decrease}"
                        ));
                    }
                    for child in [left, right] {
                        if *child <= idx || *child >= self.nodes.len() {
                            return Err(format!("node {idx}: invalid child index {child}"));
                        }
                    }
                }
                Node::Leaf { probability, .. } => {
                    if !(0.0..=1.0).contains(probability) {
                        return Err(format!(
                            "node {idx}: leaf probability {probability} outside [0, 1]"
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Class-1 probability of the leaf reached by `features`
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if features.0[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { probability, .. } => return *probability,
            }
        }
    }

    /// Unnormalized impurity decrease accumulated per feature
    pub fn raw_importances(&self) -> [f64; FEATURE_COUNT] {
        let mut totals = [0.0; FEATURE_COUNT];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[*feature] += impurity_decrease;
            }
        }
        totals
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        view: &TrainingView<'_>,
        samples: &mut [usize],
        depth: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> usize {
        let idx = self.nodes.len();
        let total = samples.len();
        let positives = count_positives(view, samples);

        self.nodes.push(Node::Leaf {
            probability: if total == 0 {
                0.0
            } else {
                positives as f64 / total as f64
            },
            samples: total,
        });

        let pure = positives == 0 || positives == total;
        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || total < params.min_samples_split.max(2) {
            return idx;
        }

        let Some(split) = best_split(view, samples, positives, params, rng) else {
            return idx;
        };

        samples.sort_by_key(|&i| view.features[i].0[split.feature] > split.threshold);
        let mid = samples
            .iter()
            .take_while(|&&i| view.features[i].0[split.feature] <= split.threshold)
            .count();
        let (left_samples, right_samples) = samples.split_at_mut(mid);

        let left = self.grow(view, left_samples, depth + 1, params, rng);
        let right = self.grow(view, right_samples, depth + 1, params, rng);

        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity_decrease: split.impurity_decrease,
        };
        idx
    }
}

fn count_positives(view: &TrainingView<'_>, samples: &[usize]) -> usize {
    samples.iter().filter(|&&i| view.labels[i] == 1).count()
}

/// Gini impurity of a binary node
fn gini(positives: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}

/// Search a random subset of features for the best Gini split.
///
/// Features are visited in shuffled order. At least `max_features` are
/// examined; if none of those yields a valid split the search continues
/// through the rest.
fn best_split<R: Rng + ?Sized>(
    view: &TrainingView<'_>,
    samples: &[usize],
    positives: usize,
    params: &TreeParams,
    rng: &mut R,
) -> Option<SplitCandidate> {
    let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
    order.shuffle(rng);

    let total = samples.len();
    let parent_impurity = gini(positives, total);
    let min_leaf = params.min_samples_leaf.max(1);
    let max_features = params.max_features.clamp(1, FEATURE_COUNT);

    let mut best: Option<SplitCandidate> = None;
    let mut column: Vec<(f64, u8)> = Vec::with_capacity(total);

    for (visited, &feature) in order.iter().enumerate() {
        if visited >= max_features && best.is_some() {
            break;
        }

        column.clear();
        column.extend(
            samples
                .iter()
                .map(|&i| (view.features[i].0[feature], view.labels[i])),
        );
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_positives = 0;
        for i in 0..total - 1 {
            if column[i].1 == 1 {
                left_positives += 1;
            }

            let (value, next) = (column[i].0, column[i + 1].0);
            if value == next {
                continue;
            }

            let left_total = i + 1;
            let right_total = total - left_total;
            if left_total < min_leaf || right_total < min_leaf {
                continue;
            }

            let weighted_children = (left_total as f64 * gini(left_positives, left_total)
                + right_total as f64 * gini(positives - left_positives, right_total))
                / total as f64;
            let decrease = total as f64 * (parent_impurity - weighted_children);

            if decrease > MIN_IMPURITY_DECREASE
                && best
                    .as_ref()
                    .map_or(true, |b| decrease > b.impurity_decrease)
            {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity_decrease: decrease,
                });
            }
        }
    }

    best
}
