//! Batch input parsing
//!
//! Reads many [`RawScreeningInput`]s from one document. CSV needs a header
//! row naming the fields; NDJSON holds one object per line; JSON is an array
//! of objects. Objects may use either the form field names or the
//! [`ScreeningInput`](crate::types::ScreeningInput) names, so the `input`
//! block of a JSON report can be fed back in.

use crate::error::RiskError;
use crate::types::RawScreeningInput;
use tracing::debug;

/// Supported batch document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Csv,
    Ndjson,
    Json,
}

/// Parse a batch document into raw inputs, in document order
pub fn parse_batch(data: &str, format: BatchFormat) -> Result<Vec<RawScreeningInput>, RiskError> {
    let inputs = match format {
        BatchFormat::Csv => parse_csv(data)?,
        BatchFormat::Ndjson => parse_ndjson(data)?,
        BatchFormat::Json => serde_json::from_str(data)?,
    };

    debug!(records = inputs.len(), ?format, "parsed batch input");
    Ok(inputs)
}

fn parse_csv(data: &str) -> Result<Vec<RawScreeningInput>, RiskError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut inputs = Vec::new();
    for record in reader.deserialize::<RawScreeningInput>() {
        inputs.push(record?);
    }
    Ok(inputs)
}

fn parse_ndjson(data: &str) -> Result<Vec<RawScreeningInput>, RiskError> {
    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|e| RiskError::Dataset {
                row: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FeatureEncoder;
    use crate::types::{Gender, ScreeningInput, SittingBand};
    use pretty_assertions::assert_eq;

    fn at_risk_input() -> ScreeningInput {
        ScreeningInput {
            age: 45,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 80.0,
            waist_inches: 38.0,
            sitting_hours_band: SittingBand::High,
            meets_activity_guideline: false,
        }
    }

    #[test]
    fn test_csv_with_form_labels() {
        let data = "age,gender,height_cm,weight_kg,waist_inches,sitting_hours,physical_activity\n\
                    45, Male ,170,80,38,More than 8 hours,No\n\
                    35,female,160,55,30,Less than 4 hours,Yes\n";

        let inputs = parse_batch(data, BatchFormat::Csv).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(FeatureEncoder::parse(&inputs[0]).unwrap(), at_risk_input());
        assert_eq!(inputs[1].physical_activity, "Yes");
    }

    #[test]
    fn test_csv_short_headers_and_coded_activity() {
        let data = "age,gender,height,weight,waist,sitting,activity\n\
                    45,male,170,80,38,high,0\n\
                    50,male,170,80,38,high,true\n";

        let inputs = parse_batch(data, BatchFormat::Csv).unwrap();
        assert_eq!(FeatureEncoder::parse(&inputs[0]).unwrap(), at_risk_input());
        assert!(FeatureEncoder::parse(&inputs[1]).unwrap().meets_activity_guideline);
    }

    #[test]
    fn test_ndjson_accepts_report_input_block() {
        let line = serde_json::to_string(&at_risk_input()).unwrap();
        assert!(line.contains("\"meets_activity_guideline\":false"));
        let short_names = r#"{"age":35,"gender":"Female","height":160,"weight":55,"waist":30,"sitting":"4-8 hours","activity":"Yes"}"#;
        let data = format!("{line}\n\n{short_names}\n");

        let inputs = parse_batch(&data, BatchFormat::Ndjson).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(FeatureEncoder::parse(&inputs[0]).unwrap(), at_risk_input());

        let second = FeatureEncoder::parse(&inputs[1]).unwrap();
        assert_eq!(second.sitting_hours_band, SittingBand::Medium);
        assert!(second.meets_activity_guideline);
    }

    #[test]
    fn test_ndjson_error_reports_line() {
        let data = "{\"age\":35}\n";
        assert!(matches!(
            parse_batch(data, BatchFormat::Ndjson),
            Err(RiskError::Dataset { row: 1, .. })
        ));
    }

    #[test]
    fn test_json_array_round_trips_typed_inputs() {
        let mut active = at_risk_input();
        active.meets_activity_guideline = true;
        let data = serde_json::to_string(&vec![at_risk_input(), active.clone()]).unwrap();

        let inputs = parse_batch(&data, BatchFormat::Json).unwrap();
        let parsed: Vec<ScreeningInput> = inputs
            .iter()
            .map(|raw| FeatureEncoder::parse(raw).unwrap())
            .collect();

        assert_eq!(parsed, vec![at_risk_input(), active]);
    }

    #[test]
    fn test_json_rejects_unknown_activity_shape() {
        let data = "[{\"age\":35,\"gender\":\"male\",\"height_cm\":170,\"weight_kg\":70,\
                    \"waist_inches\":32,\"sitting_hours\":\"low\",\"physical_activity\":[1]}]";
        assert!(matches!(
            parse_batch(data, BatchFormat::Json),
            Err(RiskError::JsonError(_))
        ));
    }
}
