//! Labeled screening dataset
//!
//! Reads the survey export used for training. The file has a header row and
//! 17 columns that are identified by position, not by header text; the
//! positional names are listed in [`DATASET_COLUMNS`]. Only the seven model
//! inputs and the target are used. Every row is parsed through the shared
//! feature encoder and phenotype transform, so training sees exactly the
//! vectors inference would build.

use crate::encoder::FeatureEncoder;
use crate::error::RiskError;
use crate::features::FeatureAssembler;
use crate::types::{FeatureVector, ScreeningInput};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Positional column names of the survey export
pub const DATASET_COLUMNS: [&str; 17] = [
    "Timestamp",
    "Age",
    "Gender",
    "Ethnicity",
    "Employed",
    "Role",
    "Height",
    "Weight",
    "Waist_Inches",
    "Weight_Increase",
    "Sitting_Hours",
    "Physical_Activity",
    "Fast_Food",
    "Sugar_Intake",
    "Family_History",
    "Blood_Pressure",
    "Target",
];

const COL_AGE: usize = 1;
const COL_GENDER: usize = 2;
const COL_HEIGHT: usize = 6;
const COL_WEIGHT: usize = 7;
const COL_WAIST: usize = 8;
const COL_SITTING: usize = 10;
const COL_ACTIVITY: usize = 11;
const COL_TARGET: usize = 16;

/// One labeled row
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub input: ScreeningInput,
    pub features: FeatureVector,
    /// 1 = high risk
    pub label: u8,
}

/// All rows of a dataset, already encoded
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn from_path(path: &Path) -> Result<Self, RiskError> {
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!(rows = dataset.len(), path = %path.display(), "loaded training dataset");
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RiskError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, row) in csv_reader.records().enumerate() {
            // Row 1 is the header
            let row_number = index + 2;
            let row = row?;
            if row.iter().all(|field| field.is_empty()) {
                debug!(row = row_number, "skipping blank row");
                continue;
            }
            records.push(parse_row(&row, row_number)?);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[LabeledRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows labeled high risk
    pub fn positives(&self) -> usize {
        self.records.iter().filter(|r| r.label == 1).count()
    }

    /// Feature matrix and label column, row-aligned
    pub fn to_training_data(&self) -> (Vec<FeatureVector>, Vec<u8>) {
        self.records.iter().map(|r| (r.features, r.label)).unzip()
    }
}

fn parse_row(row: &StringRecord, row_number: usize) -> Result<LabeledRecord, RiskError> {
    if row.len() != DATASET_COLUMNS.len() {
        return Err(RiskError::Dataset {
            row: row_number,
            message: format!(
                "expected {} columns, found {}",
                DATASET_COLUMNS.len(),
                row.len()
            ),
        });
    }

    let with_row = |e: RiskError| RiskError::Dataset {
        row: row_number,
        message: e.to_string(),
    };

    let input = ScreeningInput {
        age: parse_number::<u32>(row, COL_AGE, row_number)?,
        gender: FeatureEncoder::parse_gender(field(row, COL_GENDER)).map_err(with_row)?,
        height_cm: parse_number::<f64>(row, COL_HEIGHT, row_number)?,
        weight_kg: parse_number::<f64>(row, COL_WEIGHT, row_number)?,
        waist_inches: parse_number::<f64>(row, COL_WAIST, row_number)?,
        sitting_hours_band: FeatureEncoder::parse_sitting(field(row, COL_SITTING))
            .map_err(with_row)?,
        meets_activity_guideline: FeatureEncoder::parse_activity(field(row, COL_ACTIVITY))
            .map_err(with_row)?,
    };
    let label = FeatureEncoder::parse_target(field(row, COL_TARGET)).map_err(with_row)?;
    let (_, features) = FeatureAssembler::assemble(&input).map_err(with_row)?;

    Ok(LabeledRecord {
        input,
        features,
        label,
    })
}

fn field(row: &StringRecord, column: usize) -> &str {
    row.get(column).unwrap_or_default()
}

fn parse_number<T: std::str::FromStr>(
    row: &StringRecord,
    column: usize,
    row_number: usize,
) -> Result<T, RiskError> {
    let raw = field(row, column);
    raw.parse::<T>().map_err(|_| RiskError::Dataset {
        row: row_number,
        message: format!("{} is not a number: {:?}", DATASET_COLUMNS[column], raw),
    })
}
