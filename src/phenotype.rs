//! Phenotype transform
//!
//! Derives the thin-fat phenotype metrics from raw anthropometric inputs:
//! - Body mass index from weight and height
//! - Waist circumference converted from inches to centimeters
//! - Waist-to-height ratio
//!
//! Values are not rounded here; rounding is left to the report layer.

use crate::error::RiskError;
use crate::types::{DerivedMetrics, ScreeningInput};

/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;

/// Transform from measurements to derived metrics
pub struct PhenotypeTransform;

impl PhenotypeTransform {
    /// Derive metrics for a screening input
    pub fn derive(input: &ScreeningInput) -> Result<DerivedMetrics, RiskError> {
        Self::from_measurements(input.height_cm, input.weight_kg, input.waist_inches)
    }

    /// Derive metrics from bare measurements.
    ///
    /// Every measurement must be positive and finite.
    pub fn from_measurements(
        height_cm: f64,
        weight_kg: f64,
        waist_inches: f64,
    ) -> Result<DerivedMetrics, RiskError> {
        let height_cm = require_positive("height_cm", height_cm)?;
        let weight_kg = require_positive("weight_kg", weight_kg)?;
        let waist_inches = require_positive("waist_inches", waist_inches)?;

        let waist_cm = compute_waist_cm(waist_inches);

        Ok(DerivedMetrics {
            bmi: compute_bmi(height_cm, weight_kg),
            waist_cm,
            whtr: waist_cm / height_cm,
        })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<f64, RiskError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RiskError::InvalidMeasurement { field, value })
    }
}

/// BMI: weight (kg) / height (m)^2
fn compute_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

fn compute_waist_cm(waist_inches: f64) -> f64 {
    waist_inches * CM_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gender, SittingBand};

    fn make_input(height_cm: f64, weight_kg: f64, waist_inches: f64) -> ScreeningInput {
        ScreeningInput {
            age: 35,
            gender: Gender::Male,
            height_cm,
            weight_kg,
            waist_inches,
            sitting_hours_band: SittingBand::Medium,
            meets_activity_guideline: true,
        }
    }

    #[test]
    fn test_bmi_formula() {
        for (height, weight) in [(170.0, 70.0), (155.5, 48.2), (201.0, 130.0)] {
            let metrics = PhenotypeTransform::derive(&make_input(height, weight, 30.0)).unwrap();
            let expected = weight / ((height / 100.0) * (height / 100.0));
            assert!((metrics.bmi - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_waist_conversion() {
        let metrics = PhenotypeTransform::derive(&make_input(170.0, 70.0, 32.0)).unwrap();
        assert!((metrics.waist_cm - 81.28).abs() < 1e-9);

        let metrics = PhenotypeTransform::derive(&make_input(170.0, 70.0, 38.0)).unwrap();
        assert!((metrics.waist_cm - 96.52).abs() < 1e-9);
    }

    #[test]
    fn test_waist_to_height_ratio() {
        let metrics = PhenotypeTransform::derive(&make_input(170.0, 70.0, 32.0)).unwrap();
        // 81.28 / 170 = 0.4781
        assert!((metrics.whtr - 81.28 / 170.0).abs() < 1e-12);
        assert!((metrics.whtr - 0.478).abs() < 0.001);
    }

    #[test]
    fn test_zero_height_rejected() {
        let err = PhenotypeTransform::derive(&make_input(0.0, 70.0, 32.0)).unwrap_err();
        assert!(matches!(
            err,
            RiskError::InvalidMeasurement {
                field: "height_cm",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = PhenotypeTransform::derive(&make_input(170.0, -1.0, 32.0)).unwrap_err();
        assert!(matches!(
            err,
            RiskError::InvalidMeasurement {
                field: "weight_kg",
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(PhenotypeTransform::from_measurements(f64::NAN, 70.0, 32.0).is_err());
        assert!(PhenotypeTransform::from_measurements(170.0, f64::INFINITY, 32.0).is_err());
        assert!(PhenotypeTransform::from_measurements(170.0, 70.0, 0.0).is_err());
    }
}
