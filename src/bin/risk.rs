//! Risk CLI - Command-line interface for thin-fat diabetes risk screening
//!
//! Commands:
//! - train: Fit the random forest on a labeled survey export
//! - predict: Screen one person from command-line answers
//! - batch: Screen many people from CSV / NDJSON / JSON input
//! - importances: Show the model's feature-importance ranking
//! - doctor: Diagnose configuration and model artifact health
//! - schema: Print the feature order and category codes

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use thinfat_risk::batch::{parse_batch, BatchFormat};
use thinfat_risk::bounds::{BoundViolation, FormBounds};
use thinfat_risk::config::RiskConfig;
use thinfat_risk::encoder::FeatureEncoder;
use thinfat_risk::features::{FEATURE_LABELS, FEATURE_NAMES};
use thinfat_risk::model::{named_importances, ranked_importances, ForestParams, ModelArtifact};
use thinfat_risk::report::{render_importances, render_text, ReportRenderer};
use thinfat_risk::training::train_from_path;
use thinfat_risk::types::{RawScreeningInput, Screening};
use thinfat_risk::{
    telemetry, ModelCache, RiskError, RiskPredictor, PRODUCER_NAME, RISK_VERSION,
};

/// Risk - diabetes risk screening for the South Asian thin-fat phenotype
#[derive(Parser)]
#[command(name = "risk")]
#[command(version = RISK_VERSION)]
#[command(
    about = "Screen anthropometric and lifestyle answers for diabetes risk",
    long_about = None
)]
struct Cli {
    /// Model artifact path (overrides RISK_MODEL_PATH)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Log level or filter (overrides RISK_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the random forest on a labeled survey export
    Train {
        /// Labeled CSV (17 columns, header row)
        #[arg(short, long)]
        data: PathBuf,

        /// Where to write the artifact (defaults to the model path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of trees
        #[arg(long)]
        trees: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Screen one person
    Predict {
        /// Age in years
        #[arg(long)]
        age: u32,

        /// male or female
        #[arg(long)]
        gender: String,

        /// Height (cm)
        #[arg(long)]
        height: f64,

        /// Weight (kg)
        #[arg(long)]
        weight: f64,

        /// Waist circumference (inches)
        #[arg(long)]
        waist: f64,

        /// Daily sitting: low (<4h), medium (4-8h) or high (>8h)
        #[arg(long)]
        sitting: String,

        /// 150 minutes of exercise per week: yes or no
        #[arg(long)]
        activity: String,

        /// Output format
        #[arg(long, default_value = "text")]
        format: ReportFormat,

        /// Skip the form range checks
        #[arg(long)]
        allow_out_of_range: bool,
    },

    /// Screen many people from a file
    Batch {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "csv")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Show the feature-importance ranking
    Importances {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and model health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the feature order and category codes
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// CSV with a header row
    Csv,
    /// Newline-delimited JSON (one input per line)
    Ndjson,
    /// JSON array of inputs
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// JSON array of reports
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summaries
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RiskCliError> {
    let mut config = RiskConfig::load().map_err(|e| RiskCliError::Config(e.to_string()))?;
    if let Some(model) = cli.model {
        config.model_path = model;
    }
    if let Some(level) = cli.log_level {
        config.telemetry.log_level = level;
    }
    telemetry::init(&config.telemetry).map_err(|e| RiskCliError::Config(e.to_string()))?;

    match cli.command {
        Commands::Train {
            data,
            output,
            trees,
            seed,
        } => {
            let mut params = config.training;
            if let Some(trees) = trees {
                params.n_estimators = trees;
            }
            if let Some(seed) = seed {
                params.seed = seed;
            }
            let output = output.unwrap_or(config.model_path);
            cmd_train(&data, &output, &params)
        }

        Commands::Predict {
            age,
            gender,
            height,
            weight,
            waist,
            sitting,
            activity,
            format,
            allow_out_of_range,
        } => {
            let raw = RawScreeningInput {
                age,
                gender,
                height_cm: height,
                weight_kg: weight,
                waist_inches: waist,
                sitting_hours: sitting,
                physical_activity: activity,
            };
            cmd_predict(&config.model_path, &raw, format, allow_out_of_range)
        }

        Commands::Batch {
            input,
            output,
            input_format,
            output_format,
        } => cmd_batch(&config.model_path, &input, &output, input_format, output_format),

        Commands::Importances { json } => cmd_importances(&config.model_path, json),

        Commands::Doctor { json } => cmd_doctor(&config, json),

        Commands::Schema { json } => cmd_schema(json),
    }
}

fn cmd_train(
    data: &Path,
    output: &Path,
    params: &ForestParams,
) -> Result<(), RiskCliError> {
    let artifact = train_from_path(data, output, params)?;

    println!("Model trained and saved to {}", output.display());
    println!("Model ID:          {}", artifact.model_id);
    println!("Trees:             {}", artifact.forest.n_estimators());
    if let Some(summary) = &artifact.training {
        println!("Rows:              {}", summary.rows);
        println!("High-risk rows:    {}", summary.positives);
        println!("Training accuracy: {:.1}%", summary.training_accuracy * 100.0);
    }

    Ok(())
}

fn cmd_predict(
    model_path: &Path,
    raw: &RawScreeningInput,
    format: ReportFormat,
    allow_out_of_range: bool,
) -> Result<(), RiskCliError> {
    let input = FeatureEncoder::parse(raw)?;

    let violations = FormBounds::default().check(&input);
    if !violations.is_empty() {
        if allow_out_of_range {
            for v in &violations {
                warn!(field = %v.field, value = v.value, "input outside form range");
            }
        } else {
            return Err(RiskCliError::OutOfRange(violations));
        }
    }

    let cache = ModelCache::shared(model_path)?;
    let model = cache.get()?;
    let predictor = RiskPredictor::new(model.clone());
    let screening = predictor.screen(&input)?;
    let renderer = ReportRenderer::new().with_model_id(model.model_id);

    match format {
        ReportFormat::Text => print!("{}", render_text(&screening)),
        ReportFormat::Json => println!("{}", renderer.to_json(&screening)?),
        ReportFormat::JsonPretty => println!("{}", renderer.to_json_pretty(&screening)?),
    }

    Ok(())
}

fn cmd_batch(
    model_path: &Path,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), RiskCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(RiskCliError::StdinIsTerminal);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let raw_inputs = parse_batch(&input_data, input_format.into())?;
    if raw_inputs.is_empty() {
        return Err(RiskCliError::NoInputs);
    }

    let model = ModelCache::shared(model_path)?.get()?;
    let predictor = RiskPredictor::new(model.clone());

    let screenings = raw_inputs
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            predictor
                .screen_raw(raw)
                .map_err(|source| RiskCliError::Record { index, source })
        })
        .collect::<Result<Vec<Screening>, RiskCliError>>()?;

    info!(records = screenings.len(), "batch screened");

    let renderer = ReportRenderer::new().with_model_id(model.model_id);
    let output_data = format_output(&renderer, &screenings, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_importances(model_path: &Path, json: bool) -> Result<(), RiskCliError> {
    let model = ModelCache::shared(model_path)?.get()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&named_importances(model.as_ref()))?);
    } else {
        println!("Feature Importance (Variable Weighting)");
        println!("=======================================");
        print!("{}", render_importances(&ranked_importances(model.as_ref())));
    }

    Ok(())
}

fn cmd_doctor(config: &RiskConfig, json: bool) -> Result<(), RiskCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "risk_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Risk version {}", RISK_VERSION),
    });

    checks.push(DoctorCheck {
        name: "feature_schema".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} features: {}", FEATURE_NAMES.len(), FEATURE_NAMES.join(", ")),
    });

    let model_check = match ModelArtifact::load(&config.model_path) {
        Ok(artifact) => {
            let accuracy = artifact
                .training
                .as_ref()
                .map(|t| format!(", training accuracy {:.1}%", t.training_accuracy * 100.0))
                .unwrap_or_default();
            DoctorCheck {
                name: "model".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Model {} ({} trees, trained {}{})",
                    artifact.model_id,
                    artifact.forest.n_estimators(),
                    artifact.trained_at.to_rfc3339(),
                    accuracy
                ),
            }
        }
        Err(RiskError::ModelUnavailable { path, .. }) if !path.exists() => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Warning,
            message: format!("No model at {} (not ready; run 'risk train')", path.display()),
        },
        Err(e) => DoctorCheck {
            name: "model".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    };
    checks.push(model_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: RISK_VERSION.to_string(),
        model_path: config.model_path.display().to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Risk Doctor Report");
        println!("==================");
        println!("Producer:   {}", report.producer);
        println!("Version:    {}", report.version);
        println!("Model path: {}", report.model_path);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RiskCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(json: bool) -> Result<(), RiskCliError> {
    if json {
        let schema = serde_json::json!({
            "features": FEATURE_NAMES
                .iter()
                .zip(FEATURE_LABELS.iter())
                .enumerate()
                .map(|(position, (name, label))| serde_json::json!({
                    "position": position,
                    "name": name,
                    "label": label,
                }))
                .collect::<Vec<_>>(),
            "codes": {
                "gender": { "male": 1, "female": 0 },
                "sitting_hours": { "low": 0, "medium": 1, "high": 2 },
                "physical_activity": { "yes": 1, "no": 0 },
            },
        });
        println!("{}", serde_json::to_string_pretty(&schema)?);
    } else {
        println!("Feature order (model input):");
        let rows = FEATURE_NAMES.iter().zip(FEATURE_LABELS.iter()).enumerate();
        for (position, (name, label)) in rows {
            println!("  {position}. {name:<18} {label}");
        }
        println!();
        println!("Category codes:");
        println!("  gender:            male = 1, female = 0");
        println!("  sitting_hours:     low (<4h) = 0, medium (4-8h) = 1, high (>8h) = 2");
        println!("  physical_activity: yes = 1, no = 0");
        println!();
        println!("Derived metrics:");
        println!("  bmi      = weight_kg / (height_cm / 100)^2");
        println!("  waist_cm = waist_inches * 2.54");
        println!("  whtr     = waist_cm / height_cm");
    }

    Ok(())
}

// Helper functions

impl From<InputFormat> for BatchFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Csv => BatchFormat::Csv,
            InputFormat::Ndjson => BatchFormat::Ndjson,
            InputFormat::Json => BatchFormat::Json,
        }
    }
}

fn format_output(
    renderer: &ReportRenderer,
    screenings: &[Screening],
    format: &OutputFormat,
) -> Result<String, RiskCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for screening in screenings {
                lines.push(renderer.to_json(screening)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => {
            let reports: Vec<_> = screenings.iter().map(|s| renderer.build(s)).collect();
            Ok(serde_json::to_string(&reports)?)
        }
        OutputFormat::JsonPretty => {
            let reports: Vec<_> = screenings.iter().map(|s| renderer.build(s)).collect();
            Ok(serde_json::to_string_pretty(&reports)?)
        }
        OutputFormat::Text => Ok(screenings
            .iter()
            .map(render_text)
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

// Error types

#[derive(Debug)]
enum RiskCliError {
    Io(io::Error),
    Risk(RiskError),
    Json(serde_json::Error),
    Config(String),
    Record { index: usize, source: RiskError },
    OutOfRange(Vec<BoundViolation>),
    NoInputs,
    StdinIsTerminal,
    DoctorFailed,
}

impl From<io::Error> for RiskCliError {
    fn from(e: io::Error) -> Self {
        RiskCliError::Io(e)
    }
}

impl From<RiskError> for RiskCliError {
    fn from(e: RiskError) -> Self {
        RiskCliError::Risk(e)
    }
}

impl From<serde_json::Error> for RiskCliError {
    fn from(e: serde_json::Error) -> Self {
        RiskCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RiskError> for CliError {
    fn from(e: RiskError) -> Self {
        let (code, hint) = match &e {
            RiskError::InvalidMeasurement { .. } => (
                "INVALID_MEASUREMENT",
                "Height, weight and waist must be positive numbers",
            ),
            RiskError::UnknownCategory { .. } => (
                "UNKNOWN_CATEGORY",
                "Run 'risk schema' to see accepted category values",
            ),
            RiskError::ModelUnavailable { .. } => (
                "MODEL_NOT_READY",
                "Train a model with 'risk train --data <csv>' or set RISK_MODEL_PATH",
            ),
            RiskError::Dataset { .. } => ("DATASET_ERROR", "Fix the reported row and retry"),
            RiskError::Training(_) => ("TRAINING_ERROR", "Check the dataset contents"),
            RiskError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
            RiskError::CsvError(_) => (
                "CSV_ERROR",
                "Expected header: age,gender,height_cm,weight_kg,waist_inches,sitting_hours,physical_activity",
            ),
            RiskError::IoError(_) => ("IO_ERROR", "Check file paths and permissions"),
        };
        CliError {
            code: code.to_string(),
            message: e.to_string(),
            hint: Some(hint.to_string()),
        }
    }
}

impl From<RiskCliError> for CliError {
    fn from(e: RiskCliError) -> Self {
        match e {
            RiskCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RiskCliError::Risk(e) => CliError::from(e),
            RiskCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RiskCliError::Config(message) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message,
                hint: Some("Check RISK_* environment variables and --log-level".to_string()),
            },
            RiskCliError::Record { index, source } => {
                let inner = CliError::from(source);
                CliError {
                    code: inner.code,
                    message: format!("record {}: {}", index, inner.message),
                    hint: inner.hint,
                }
            }
            RiskCliError::OutOfRange(violations) => CliError {
                code: "OUT_OF_RANGE".to_string(),
                message: violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
                hint: Some("Pass --allow-out-of-range to screen anyway".to_string()),
            },
            RiskCliError::NoInputs => CliError {
                code: "NO_INPUTS".to_string(),
                message: "No screening inputs found".to_string(),
                hint: Some("Ensure the input file is not empty".to_string()),
            },
            RiskCliError::StdinIsTerminal => CliError {
                code: "STDIN_IS_TERMINAL".to_string(),
                message: "Batch input '-' expects piped data but stdin is a terminal".to_string(),
                hint: Some(
                    "Pipe a file, e.g. 'cat people.csv | risk batch -i - -o -'".to_string(),
                ),
            },
            RiskCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    model_path: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
