//! Feature schema and vector assembly
//!
//! The classifier consumes seven numbers in a fixed order. That order is
//! declared once here and used by training, inference, the persisted model
//! artifact and the importance ranking. Reordering it silently corrupts
//! predictions, so artifacts record it and are rejected on mismatch.

use crate::encoder::{CategoricalCodes, FeatureEncoder};
use crate::error::RiskError;
use crate::phenotype::PhenotypeTransform;
use crate::types::{DerivedMetrics, FeatureVector, ScreeningInput};

/// Number of model features
pub const FEATURE_COUNT: usize = 7;

/// Feature order shared by training and inference
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "gender",
    "bmi",
    "waist_cm",
    "whtr",
    "sitting_hours",
    "physical_activity",
];

/// Display names, aligned with [`FEATURE_NAMES`]
pub const FEATURE_LABELS: [&str; FEATURE_COUNT] = [
    "Age",
    "Gender",
    "BMI",
    "Waist (cm)",
    "WHtR",
    "Sitting Hours",
    "Physical Activity",
];

/// Builds model feature vectors from screening inputs
pub struct FeatureAssembler;

impl FeatureAssembler {
    /// Run the phenotype transform and encoder, then assemble the vector
    pub fn assemble(input: &ScreeningInput) -> Result<(DerivedMetrics, FeatureVector), RiskError> {
        let metrics = PhenotypeTransform::derive(input)?;
        let codes = FeatureEncoder::encode(input);
        Ok((metrics, Self::from_parts(input.age, &metrics, &codes)))
    }

    /// Assemble from already derived parts
    pub fn from_parts(
        age: u32,
        metrics: &DerivedMetrics,
        codes: &CategoricalCodes,
    ) -> FeatureVector {
        FeatureVector([
            f64::from(age),
            codes.gender,
            metrics.bmi,
            metrics.waist_cm,
            metrics.whtr,
            codes.sitting,
            codes.activity,
        ])
    }
}

/// Check a declared feature order against the built-in schema
pub fn schema_matches<S: AsRef<str>>(names: &[S]) -> bool {
    names.len() == FEATURE_COUNT
        && names
            .iter()
            .zip(FEATURE_NAMES.iter())
            .all(|(declared, expected)| declared.as_ref() == *expected)
}
