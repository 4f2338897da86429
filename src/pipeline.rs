//! Pipeline orchestration
//!
//! This module provides the public inference API. It runs a screening input
//! through the phenotype transform and feature encoder, then asks the risk
//! model for a class decision and a probability.

use crate::encoder::FeatureEncoder;
use crate::error::RiskError;
use crate::features::FeatureAssembler;
use crate::model::{named_importances, ranked_importances, RiskModel};
use crate::types::{
    FeatureImportance, FeatureVector, PredictionResult, RawScreeningInput, RiskLabel, Screening,
    ScreeningInput,
};
use std::sync::Arc;

/// Score one screening input against a model.
///
/// Pipeline stages:
/// 1. PhenotypeTransform - BMI, waist (cm), waist-to-height ratio
/// 2. FeatureEncoder - categorical codes
/// 3. FeatureAssembler - fixed-order feature vector
/// 4. RiskModel - class decision and class-1 probability
///
/// Errors from stages 1-2 are returned unchanged and no partial result is
/// produced.
///
/// # Example
/// ```ignore
/// let result = infer(&input, &model)?;
/// println!("{} ({:.1}%)", result.label, result.probability * 100.0);
/// ```
pub fn infer<M: RiskModel + ?Sized>(
    input: &ScreeningInput,
    model: &M,
) -> Result<PredictionResult, RiskError> {
    let (_, features) = FeatureAssembler::assemble(input)?;
    Ok(predict_vector(&features, model))
}

fn predict_vector<M: RiskModel + ?Sized>(features: &FeatureVector, model: &M) -> PredictionResult {
    PredictionResult {
        label: RiskLabel::from_class(model.predict(features)),
        probability: model.predict_proba(features),
    }
}

/// Holds a loaded model and produces full screenings.
///
/// Use this when the caller also needs the derived metrics and feature vector,
/// for example to render a report.
#[derive(Clone)]
pub struct RiskPredictor {
    model: Arc<dyn RiskModel>,
}

impl RiskPredictor {
    pub fn new(model: Arc<dyn RiskModel>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn RiskModel {
        self.model.as_ref()
    }

    /// Same contract as [`infer`]
    pub fn infer(&self, input: &ScreeningInput) -> Result<PredictionResult, RiskError> {
        infer(input, self.model.as_ref())
    }

    /// Run the pipeline and keep every intermediate value
    pub fn screen(&self, input: &ScreeningInput) -> Result<Screening, RiskError> {
        let (metrics, features) = FeatureAssembler::assemble(input)?;
        let prediction = predict_vector(&features, self.model.as_ref());

        Ok(Screening {
            input: input.clone(),
            metrics,
            features,
            prediction,
        })
    }

    /// Parse free-text categories, then screen
    pub fn screen_raw(&self, raw: &RawScreeningInput) -> Result<Screening, RiskError> {
        let input = FeatureEncoder::parse(raw)?;
        self.screen(&input)
    }

    /// Screen many inputs, stopping at the first failure
    pub fn screen_batch(&self, inputs: &[ScreeningInput]) -> Result<Vec<Screening>, RiskError> {
        inputs.iter().map(|input| self.screen(input)).collect()
    }

    /// Importances in schema order
    pub fn feature_importances(&self) -> Vec<FeatureImportance> {
        named_importances(self.model.as_ref())
    }

    /// Importances sorted ascending by weight
    pub fn ranked_importances(&self) -> Vec<FeatureImportance> {
        ranked_importances(self.model.as_ref())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::features::FEATURE_COUNT;
    use crate::model::{DecisionTree, Node, RandomForest};
    use crate::types::{Gender, SittingBand};
    use pretty_assertions::assert_eq;

    fn split(feature: usize, threshold: f64, left: usize, right: usize, decrease: f64) -> Node {
        Node::Split {
            feature,
            threshold,
            left,
            right,
            impurity_decrease: decrease,
        }
    }

    fn leaf(probability: f64) -> Node {
        Node::Leaf {
            probability,
            samples: 10,
        }
    }

    /// Hand-built three-tree forest used as the regression reference
    pub(crate) fn reference_forest() -> RandomForest {
        RandomForest::from_trees(vec![
            // WHtR first, then sitting band
            DecisionTree::from_nodes(vec![
                split(4, 0.5, 1, 4, 40.0),
                split(5, 1.5, 2, 3, 8.0),
                leaf(0.1),
                leaf(0.55),
                leaf(0.9),
            ])
            .unwrap(),
            // Waist circumference, then activity
            DecisionTree::from_nodes(vec![
                split(3, 90.0, 1, 4, 30.0),
                split(6, 0.5, 2, 3, 6.0),
                leaf(0.6),
                leaf(0.2),
                leaf(0.85),
            ])
            .unwrap(),
            // BMI, then age
            DecisionTree::from_nodes(vec![
                split(2, 25.0, 1, 2, 20.0),
                split(0, 50.0, 3, 4, 4.0),
                leaf(0.8),
                leaf(0.15),
                leaf(0.5),
            ])
            .unwrap(),
        ])
        .unwrap()
    }

    fn predictor() -> RiskPredictor {
        RiskPredictor::new(Arc::new(reference_forest()))
    }

    fn default_input() -> ScreeningInput {
        ScreeningInput {
            age: 35,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 70.0,
            waist_inches: 32.0,
            sitting_hours_band: SittingBand::Medium,
            meets_activity_guideline: true,
        }
    }

    fn at_risk_input() -> ScreeningInput {
        ScreeningInput {
            age: 45,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 80.0,
            waist_inches: 38.0,
            sitting_hours_band: SittingBand::High,
            meets_activity_guideline: false,
        }
    }

    #[test]
    fn test_end_to_end_default_form() {
        let screening = predictor().screen(&default_input()).unwrap();

        assert!((screening.metrics.bmi - 24.22).abs() < 0.01);
        assert!((screening.metrics.waist_cm - 81.28).abs() < 1e-9);
        assert!((screening.metrics.whtr - 0.478).abs() < 0.001);

        let expected = [35.0, 1.0, 24.22, 81.28, 0.478, 1.0, 1.0];
        for (actual, expected) in screening.features.0.iter().zip(expected.iter()) {
            assert!((actual - expected).abs() < 0.001);
        }

        // Trees: 0.1 (whtr <= 0.5, sitting <= 1.5), 0.2 (waist <= 90, active),
        // 0.15 (bmi <= 25, age <= 50) => mean 0.15
        assert_eq!(screening.prediction.label, RiskLabel::LowRisk);
        assert!((screening.prediction.probability - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_end_to_end_at_risk() {
        let result = predictor().infer(&at_risk_input()).unwrap();

        // Trees: 0.9 (whtr 0.568), 0.85 (waist 96.5), 0.8 (bmi 27.7) => 0.85
        assert_eq!(result.label, RiskLabel::HighRisk);
        assert!((result.probability - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_infer_deterministic() {
        let forest = reference_forest();
        let input = default_input();

        let first = infer(&input, &forest).unwrap();
        for _ in 0..50 {
            assert_eq!(infer(&input, &forest).unwrap(), first);
        }
    }

    #[test]
    fn test_zero_height_fails() {
        let mut input = default_input();
        input.height_cm = 0.0;

        let err = infer(&input, &reference_forest()).unwrap_err();
        assert!(matches!(
            err,
            RiskError::InvalidMeasurement {
                field: "height_cm",
                ..
            }
        ));
    }

    #[test]
    fn test_screen_raw_rejects_unknown_category() {
        let raw = RawScreeningInput {
            age: 35,
            gender: "Male".to_string(),
            height_cm: 170.0,
            weight_kg: 70.0,
            waist_inches: 32.0,
            sitting_hours: "sometimes".to_string(),
            physical_activity: "Yes".to_string(),
        };

        assert!(matches!(
            predictor().screen_raw(&raw),
            Err(RiskError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_screen_batch_stops_on_error() {
        let mut bad = default_input();
        bad.weight_kg = 0.0;

        let ok = predictor()
            .screen_batch(&[default_input(), at_risk_input()])
            .unwrap();
        assert_eq!(ok.len(), 2);
        assert!(predictor().screen_batch(&[default_input(), bad]).is_err());
    }

    #[test]
    fn test_feature_importances_sum_to_one() {
        let importances = predictor().feature_importances();

        assert_eq!(importances.len(), FEATURE_COUNT);
        let total: f64 = importances.iter().map(|f| f.weight).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(importances[1].weight, 0.0);
    }
}
