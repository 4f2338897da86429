//! Screening reports
//!
//! Renders a screening for people and for machines: a short text summary,
//! a JSON report with provenance, and the feature-importance ranking shown on
//! the analytics view. Rounding happens here and nowhere earlier.

use crate::error::RiskError;
use crate::features::FEATURE_LABELS;
use crate::types::{DerivedMetrics, FeatureImportance, PredictionResult, Screening, ScreeningInput};
use crate::{PRODUCER_NAME, RISK_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Width of the text bar chart
const BAR_WIDTH: usize = 40;

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Headline and metrics line as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub headline: String,
    pub metrics_line: String,
}

/// Full JSON report for one screening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: DateTime<Utc>,
    /// Identifier of the model artifact, when known
    pub model_id: Option<Uuid>,
    pub input: ScreeningInput,
    pub metrics: DerivedMetrics,
    /// Feature values keyed by schema name, in schema order
    pub features: Vec<(String, f64)>,
    pub prediction: PredictionResult,
    pub summary: ReportSummary,
}

/// Builds reports with a stable instance id
pub struct ReportRenderer {
    instance_id: String,
    model_id: Option<Uuid>,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            model_id: None,
        }
    }

    /// Tag every report with the model that produced it
    pub fn with_model_id(mut self, model_id: Uuid) -> Self {
        self.model_id = Some(model_id);
        self
    }

    pub fn build(&self, screening: &Screening) -> ScreeningReport {
        ScreeningReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: RISK_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now(),
            model_id: self.model_id,
            input: screening.input.clone(),
            metrics: screening.metrics,
            features: screening
                .features
                .named()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            prediction: screening.prediction,
            summary: ReportSummary {
                headline: headline(&screening.prediction),
                metrics_line: metrics_line(&screening.metrics),
            },
        }
    }

    pub fn to_json(&self, screening: &Screening) -> Result<String, RiskError> {
        serde_json::to_string(&self.build(screening)).map_err(RiskError::JsonError)
    }

    pub fn to_json_pretty(&self, screening: &Screening) -> Result<String, RiskError> {
        serde_json::to_string_pretty(&self.build(screening)).map_err(RiskError::JsonError)
    }
}

/// "High Risk Identified (72.0%)"
pub fn headline(prediction: &PredictionResult) -> String {
    format!(
        "{} Identified ({:.1}%)",
        prediction.label,
        prediction.probability * 100.0
    )
}

/// "Metrics: BMI: 24.2 | WHtR: 0.48"
pub fn metrics_line(metrics: &DerivedMetrics) -> String {
    format!("Metrics: BMI: {:.1} | WHtR: {:.2}", metrics.bmi, metrics.whtr)
}

/// Plain-text summary of a screening
pub fn render_text(screening: &Screening) -> String {
    let input = &screening.input;
    let mut out = String::new();

    let _ = writeln!(out, "Diabetes Risk Screening");
    let _ = writeln!(out, "=======================");
    let _ = writeln!(out, "{}", headline(&screening.prediction));
    let _ = writeln!(out, "{}", metrics_line(&screening.metrics));
    let _ = writeln!(out);
    let _ = writeln!(out, "Inputs:");
    let _ = writeln!(out, "  Age:            {}", input.age);
    let _ = writeln!(out, "  Gender:         {}", input.gender.as_str());
    let _ = writeln!(out, "  Height:         {:.1} cm", input.height_cm);
    let _ = writeln!(out, "  Weight:         {:.1} kg", input.weight_kg);
    let _ = writeln!(
        out,
        "  Waist:          {:.1} in ({:.1} cm)",
        input.waist_inches, screening.metrics.waist_cm
    );
    let _ = writeln!(out, "  Sitting:        {}", input.sitting_hours_band.label());
    let _ = writeln!(
        out,
        "  150 min/week:   {}",
        if input.meets_activity_guideline { "Yes" } else { "No" }
    );

    out
}

/// Horizontal text bar chart of importances, in the order given
pub fn render_importances(importances: &[FeatureImportance]) -> String {
    let label_width = FEATURE_LABELS.iter().map(|l| l.len()).max().unwrap_or(0);
    let max_weight = importances
        .iter()
        .map(|f| f.weight)
        .fold(0.0_f64, f64::max);

    let mut out = String::new();
    for entry in importances {
        let filled = if max_weight > 0.0 {
            ((entry.weight / max_weight) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "{:<width$}  {:<bar$}  {:.3}",
            entry.label,
            "#".repeat(filled),
            entry.weight,
            width = label_width,
            bar = BAR_WIDTH
        );
    }
    out
}
