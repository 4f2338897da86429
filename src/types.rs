//! Core types for the screening pipeline
//!
//! This module defines the data structures that flow through each stage:
//! raw form input, typed screening input, derived phenotype metrics, the model
//! feature vector, and the prediction that comes back out.

use crate::features::{FEATURE_COUNT, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Daily sitting time, in three ordered tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SittingBand {
    /// Less than 4 hours
    Low,
    /// 4 to 8 hours
    Medium,
    /// More than 8 hours
    High,
}

impl SittingBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SittingBand::Low => "low",
            SittingBand::Medium => "medium",
            SittingBand::High => "high",
        }
    }

    /// Form label shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            SittingBand::Low => "Less than 4 hours",
            SittingBand::Medium => "4-8 hours",
            SittingBand::High => "More than 8 hours",
        }
    }
}

/// One screening submission, already validated against the category domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningInput {
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    /// Height (cm)
    pub height_cm: f64,
    /// Weight (kg)
    pub weight_kg: f64,
    /// Waist circumference (inches)
    pub waist_inches: f64,
    pub sitting_hours_band: SittingBand,
    /// Whether the person does 150 minutes of exercise per week
    pub meets_activity_guideline: bool,
}

/// Screening submission as it arrives from a form, CSV row or JSON document.
///
/// Categorical fields are free text here; the feature encoder turns them into
/// a [`ScreeningInput`] or rejects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScreeningInput {
    pub age: u32,
    pub gender: String,
    #[serde(alias = "height")]
    pub height_cm: f64,
    #[serde(alias = "weight")]
    pub weight_kg: f64,
    #[serde(alias = "waist")]
    pub waist_inches: f64,
    #[serde(alias = "sitting", alias = "sitting_hours_band")]
    pub sitting_hours: String,
    /// Free text, or a boolean / 0-1 code as written by [`ScreeningInput`]
    #[serde(
        alias = "activity",
        alias = "meets_activity_guideline",
        deserialize_with = "activity_answer"
    )]
    pub physical_activity: String,
}

/// Accepted shapes of the activity answer
#[derive(Deserialize)]
#[serde(untagged)]
enum ActivityAnswer {
    Flag(bool),
    Code(i64),
    Text(String),
}

fn activity_answer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ActivityAnswer::deserialize(deserializer)? {
        ActivityAnswer::Flag(true) => "yes".to_string(),
        ActivityAnswer::Flag(false) => "no".to_string(),
        ActivityAnswer::Code(code) => code.to_string(),
        ActivityAnswer::Text(text) => text,
    })
}

/// Phenotype metrics derived from the anthropometric inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Body mass index (kg/m^2)
    pub bmi: f64,
    /// Waist circumference (cm)
    pub waist_cm: f64,
    /// Waist-to-height ratio
    pub whtr: f64,
}

/// Fixed-order model input; see [`FEATURE_NAMES`] for the positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Pair each value with its schema name
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

/// Risk label reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    HighRisk,
    LowRisk,
}

impl RiskLabel {
    /// Class 1 is the positive (high risk) class
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            RiskLabel::HighRisk
        } else {
            RiskLabel::LowRisk
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, RiskLabel::HighRisk)
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLabel::HighRisk => write!(f, "High Risk"),
            RiskLabel::LowRisk => write!(f, "Low Risk"),
        }
    }
}

/// Model output for one screening.
///
/// `label` comes from the classifier's decision and `probability` from its
/// class-1 probability estimate. They are reported side by side and are not
/// re-derived from each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: RiskLabel,
    pub probability: f64,
}

/// Everything the presentation layer needs to render one screening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screening {
    pub input: ScreeningInput,
    pub metrics: DerivedMetrics,
    pub features: FeatureVector,
    pub prediction: PredictionResult,
}

/// One entry of the global feature-importance ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Schema name (e.g. "whtr")
    pub feature: String,
    /// Display name (e.g. "WHtR")
    pub label: String,
    /// Mean decrease in impurity, normalized so all weights sum to 1
    pub weight: f64,
}
