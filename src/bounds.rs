//! Form bounds
//!
//! The screening form constrains its controls to plausible adult ranges. The
//! core pipeline does not enforce these; entry points check them before
//! calling it.

use crate::types::ScreeningInput;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Allowed ranges for the numeric form controls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormBounds {
    pub age: RangeInclusive<u32>,
    pub height_cm: RangeInclusive<f64>,
    pub weight_kg: RangeInclusive<f64>,
    pub waist_inches: RangeInclusive<f64>,
}

impl Default for FormBounds {
    fn default() -> Self {
        Self {
            age: 18..=100,
            height_cm: 120.0..=220.0,
            weight_kg: 30.0..=200.0,
            waist_inches: 20.0..=60.0,
        }
    }
}

/// A field outside its allowed range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundViolation {
    pub field: String,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for BoundViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside {}..={}",
            self.field, self.value, self.min, self.max
        )
    }
}

impl FormBounds {
    /// All violations, in form order
    pub fn check(&self, input: &ScreeningInput) -> Vec<BoundViolation> {
        let age_range = f64::from(*self.age.start())..=f64::from(*self.age.end());
        let checks = [
            ("age", f64::from(input.age), &age_range),
            ("height_cm", input.height_cm, &self.height_cm),
            ("weight_kg", input.weight_kg, &self.weight_kg),
            ("waist_inches", input.waist_inches, &self.waist_inches),
        ];

        checks
            .into_iter()
            .filter(|(_, value, range)| !range.contains(value))
            .map(|(field, value, range)| BoundViolation {
                field: field.to_string(),
                value,
                min: *range.start(),
                max: *range.end(),
            })
            .collect()
    }
}
