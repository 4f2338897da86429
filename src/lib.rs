//! Thin-fat risk - diabetes risk screening for the South Asian thin-fat phenotype
//!
//! Screening inputs flow through a deterministic pipeline: phenotype transform
//! (BMI, waist in cm, waist-to-height ratio) → feature encoding → fixed-order
//! feature vector → random forest risk model → label and probability.
//!
//! ## Modules
//!
//! - **Inference**: `pipeline::infer` and `RiskPredictor`, shared by the
//!   interactive and batch entry points
//! - **Training**: `dataset` and `training`, using the same encoder and
//!   transform as inference
//! - **Model**: the `RiskModel` capability, the reference forest and its
//!   persisted artifact

pub mod batch;
pub mod bounds;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod features;
pub mod model;
pub mod phenotype;
pub mod pipeline;
pub mod report;
pub mod telemetry;
pub mod training;
pub mod types;

pub use cache::ModelCache;
pub use error::RiskError;
pub use features::{FEATURE_COUNT, FEATURE_NAMES};
pub use model::{ModelArtifact, RandomForest, RiskModel};
pub use pipeline::{infer, RiskPredictor};
pub use types::{
    DerivedMetrics, FeatureVector, PredictionResult, RawScreeningInput, RiskLabel, Screening,
    ScreeningInput,
};

/// Crate version embedded in artifacts and reports
pub const RISK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for artifacts and reports
pub const PRODUCER_NAME: &str = "thinfat-risk";
