//! Error types for the risk screening pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while deriving features, training or scoring
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid measurement for {field}: {value} (must be a positive, finite number)")]
    InvalidMeasurement { field: &'static str, value: f64 },

    #[error("Unknown category for {field}: {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    #[error("Model unavailable at {}: {reason}", path.display())]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("Dataset error at row {row}: {message}")]
    Dataset { row: usize, message: String },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RiskError {
    pub(crate) fn unknown_category(field: &'static str, value: &str) -> Self {
        RiskError::UnknownCategory {
            field,
            value: value.to_string(),
        }
    }

    pub(crate) fn model_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RiskError::ModelUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
