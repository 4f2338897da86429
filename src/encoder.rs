//! Feature encoding
//!
//! This module maps categorical screening answers onto the numeric codes the
//! classifier was trained with, and parses free-text answers (form labels, CSV
//! cells) into the typed domain. It is the only place these codes are defined;
//! both inference and training go through it.
//!
//! Codes:
//! - gender: male = 1, female = 0
//! - sitting band: low = 0, medium = 1, high = 2 (ordinal, must stay monotonic)
//! - activity: meets guideline = 1, otherwise 0

use crate::error::RiskError;
use crate::types::{Gender, RawScreeningInput, ScreeningInput, SittingBand};
use serde::{Deserialize, Serialize};

/// Numeric codes for the categorical part of a screening input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoricalCodes {
    pub gender: f64,
    pub sitting: f64,
    pub activity: f64,
}

/// Encoder shared by inference and training
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode the categorical fields of a typed input
    pub fn encode(input: &ScreeningInput) -> CategoricalCodes {
        CategoricalCodes {
            gender: Self::gender_code(input.gender),
            sitting: Self::sitting_code(input.sitting_hours_band),
            activity: Self::activity_code(input.meets_activity_guideline),
        }
    }

    pub fn gender_code(gender: Gender) -> f64 {
        match gender {
            Gender::Male => 1.0,
            Gender::Female => 0.0,
        }
    }

    pub fn sitting_code(band: SittingBand) -> f64 {
        match band {
            SittingBand::Low => 0.0,
            SittingBand::Medium => 1.0,
            SittingBand::High => 2.0,
        }
    }

    pub fn activity_code(meets_guideline: bool) -> f64 {
        if meets_guideline {
            1.0
        } else {
            0.0
        }
    }

    /// Parse a raw submission into a typed input.
    ///
    /// Measurements are passed through untouched; the phenotype transform
    /// validates them.
    pub fn parse(raw: &RawScreeningInput) -> Result<ScreeningInput, RiskError> {
        Ok(ScreeningInput {
            age: raw.age,
            gender: Self::parse_gender(&raw.gender)?,
            height_cm: raw.height_cm,
            weight_kg: raw.weight_kg,
            waist_inches: raw.waist_inches,
            sitting_hours_band: Self::parse_sitting(&raw.sitting_hours)?,
            meets_activity_guideline: Self::parse_activity(&raw.physical_activity)?,
        })
    }

    pub fn parse_gender(value: &str) -> Result<Gender, RiskError> {
        match normalize_label(value).as_str() {
            "male" | "m" | "1" => Ok(Gender::Male),
            "female" | "f" | "0" => Ok(Gender::Female),
            _ => Err(RiskError::unknown_category("gender", value)),
        }
    }

    pub fn parse_sitting(value: &str) -> Result<SittingBand, RiskError> {
        match normalize_label(value).as_str() {
            "low" | "less than 4 hours" | "<4" | "0" => Ok(SittingBand::Low),
            "medium" | "4-8 hours" | "4-8" | "1" => Ok(SittingBand::Medium),
            "high" | "more than 8 hours" | ">8" | "2" => Ok(SittingBand::High),
            _ => Err(RiskError::unknown_category("sitting_hours", value)),
        }
    }

    pub fn parse_activity(value: &str) -> Result<bool, RiskError> {
        match normalize_label(value).as_str() {
            "yes" | "y" | "true" | "1" => Ok(true),
            "no" | "n" | "false" | "0" => Ok(false),
            _ => Err(RiskError::unknown_category("physical_activity", value)),
        }
    }

    /// Parse a ground-truth label from the training dataset into a class
    pub fn parse_target(value: &str) -> Result<u8, RiskError> {
        match normalize_label(value).as_str() {
            "1" | "yes" | "true" | "high" | "high risk" | "diabetic" => Ok(1),
            "0" | "no" | "false" | "low" | "low risk" | "non-diabetic" => Ok(0),
            _ => Err(RiskError::unknown_category("target", value)),
        }
    }
}

/// Lowercase, trim, collapse inner whitespace and fold dash variants to '-'
fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace(" - ", "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw() -> RawScreeningInput {
        RawScreeningInput {
            age: 35,
            gender: "Male".to_string(),
            height_cm: 170.0,
            weight_kg: 70.0,
            waist_inches: 32.0,
            sitting_hours: "4\u{2013}8 hours".to_string(),
            physical_activity: "Yes".to_string(),
        }
    }

    #[test]
    fn test_gender_codes() {
        assert_eq!(FeatureEncoder::gender_code(Gender::Male), 1.0);
        assert_eq!(FeatureEncoder::gender_code(Gender::Female), 0.0);
    }

    #[test]
    fn test_sitting_codes_monotonic() {
        let low = FeatureEncoder::sitting_code(SittingBand::Low);
        let medium = FeatureEncoder::sitting_code(SittingBand::Medium);
        let high = FeatureEncoder::sitting_code(SittingBand::High);

        assert_eq!((low, medium, high), (0.0, 1.0, 2.0));
        assert!(low < medium && medium < high);
    }

    #[test]
    fn test_activity_codes() {
        assert_eq!(FeatureEncoder::activity_code(true), 1.0);
        assert_eq!(FeatureEncoder::activity_code(false), 0.0);
    }

    #[test]
    fn test_parse_form_labels() {
        let input = FeatureEncoder::parse(&make_raw()).unwrap();

        assert_eq!(input.gender, Gender::Male);
        assert_eq!(input.sitting_hours_band, SittingBand::Medium);
        assert!(input.meets_activity_guideline);
        assert_eq!(input.height_cm, 170.0);
    }

    #[test]
    fn test_parse_sitting_variants() {
        assert_eq!(
            FeatureEncoder::parse_sitting("Less than 4 hours").unwrap(),
            SittingBand::Low
        );
        assert_eq!(
            FeatureEncoder::parse_sitting("4 - 8 hours").unwrap(),
            SittingBand::Medium
        );
        assert_eq!(
            FeatureEncoder::parse_sitting("  More than 8   hours ").unwrap(),
            SittingBand::High
        );
        assert_eq!(FeatureEncoder::parse_sitting("2").unwrap(), SittingBand::High);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut raw = make_raw();
        raw.gender = "other".to_string();
        let err = FeatureEncoder::parse(&raw).unwrap_err();
        assert!(matches!(
            err,
            RiskError::UnknownCategory { field: "gender", ref value } if value == "other"
        ));

        let mut raw = make_raw();
        raw.sitting_hours = "all day".to_string();
        assert!(matches!(
            FeatureEncoder::parse(&raw),
            Err(RiskError::UnknownCategory {
                field: "sitting_hours",
                ..
            })
        ));

        let mut raw = make_raw();
        raw.physical_activity = "sometimes".to_string();
        assert!(FeatureEncoder::parse(&raw).is_err());
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(FeatureEncoder::parse_target("High Risk").unwrap(), 1);
        assert_eq!(FeatureEncoder::parse_target("0").unwrap(), 0);
        assert_eq!(FeatureEncoder::parse_target("No").unwrap(), 0);
        assert!(FeatureEncoder::parse_target("maybe").is_err());
    }
}
