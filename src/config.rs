//! Runtime configuration
//!
//! Settings come from the environment (optionally seeded from a `.env` file).
//! Command-line flags override them.

use crate::model::ForestParams;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default artifact location
pub const DEFAULT_MODEL_PATH: &str = "models/risk_model.json";

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub model_path: PathBuf,
    pub telemetry: TelemetryConfig,
    pub training: ForestParams,
}

/// Logging controls
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            training: ForestParams::default(),
        }
    }
}

impl RiskConfig {
    /// Read `.env` if present, then the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let model_path = lookup("RISK_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let log_level = lookup("RISK_LOG_LEVEL").unwrap_or(defaults.telemetry.log_level);

        let mut training = defaults.training;
        if let Some(value) = lookup("RISK_TREES") {
            training.n_estimators = parse_positive("RISK_TREES", &value)? as usize;
        }
        if let Some(value) = lookup("RISK_SEED") {
            training.seed = value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidInteger {
                    name: "RISK_SEED",
                    value,
                })?;
        }

        Ok(Self {
            model_path,
            telemetry: TelemetryConfig { log_level },
            training,
        })
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidInteger {
            name,
            value: value.to_string(),
        }),
    }
}
