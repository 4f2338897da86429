//! Model training
//!
//! Fits the reference random forest on a labeled dataset and wraps it in a
//! model artifact. The dataset has already been through the shared encoder,
//! so the forest sees the same feature order inference builds.

use crate::dataset::Dataset;
use crate::error::RiskError;
use crate::model::{ForestParams, ModelArtifact, RandomForest, RiskModel, TrainingSummary};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Fit a forest and summarize the run
pub fn train(dataset: &Dataset, params: &ForestParams) -> Result<ModelArtifact, RiskError> {
    if dataset.is_empty() {
        return Err(RiskError::Training("dataset has no rows".to_string()));
    }

    let (features, labels) = dataset.to_training_data();
    let positives = dataset.positives();
    if positives == 0 || positives == dataset.len() {
        return Err(RiskError::Training(format!(
            "dataset needs both classes, found {} high-risk rows out of {}",
            positives,
            dataset.len()
        )));
    }

    let started = Instant::now();
    info!(
        rows = dataset.len(),
        positives,
        trees = params.n_estimators,
        seed = params.seed,
        "training random forest"
    );

    let forest = RandomForest::fit(&features, &labels, params)?;

    let correct = features
        .iter()
        .zip(labels.iter())
        .filter(|(f, &label)| forest.predict(f) == label)
        .count();
    let training_accuracy = correct as f64 / features.len() as f64;

    info!(
        training_accuracy,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "training finished"
    );

    let summary = TrainingSummary {
        rows: dataset.len(),
        positives,
        training_accuracy,
        params: *params,
    };
    Ok(ModelArtifact::new(forest, Some(summary)))
}

/// Load a dataset, train, and persist the artifact
pub fn train_from_path(
    data_path: &Path,
    output_path: &Path,
    params: &ForestParams,
) -> Result<ModelArtifact, RiskError> {
    let dataset = Dataset::from_path(data_path)?;
    let artifact = train(&dataset, params)?;
    artifact.save(output_path)?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::infer;
    use crate::types::{Gender, ScreeningInput, SittingBand};
    use uuid::Uuid;

    const HEADER: &str = "Timestamp,Age,Gender,Ethnicity,Employed,Role,Height,Weight,Waist,Gain,Sitting,Activity,FastFood,Sugar,Family,BP,Target";

    /// Survey-shaped CSV where a large waist relative to height means risk
    fn synthetic_csv() -> String {
        let sitting = ["Less than 4 hours", "4-8 hours", "More than 8 hours"];
        let mut text = HEADER.to_string();
        for i in 0..48 {
            let age = 22 + (i * 7) % 50;
            let gender = if i % 2 == 0 { "Male" } else { "Female" };
            let height = 150 + (i * 3) % 40;
            let weight = 50 + (i * 5) % 40;
            let waist = 26 + (i * 11) % 18;
            let whtr = waist as f64 * 2.54 / height as f64;
            let active = if i % 4 == 0 { "Yes" } else { "No" };
            let target = if whtr > 0.52 { "Yes" } else { "No" };
            text.push_str(&format!(
                "\n2024/02/{:02} 09:00,{age},{gender},x,Yes,r,{height},{weight},{waist},No,{},{active},a,b,c,d,{target}",
                i % 28 + 1,
                sitting[i % 3]
            ));
        }
        text
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_estimators: 20,
            ..ForestParams::default()
        }
    }

    #[test]
    fn test_train_summary() {
        let dataset = Dataset::from_reader(synthetic_csv().as_bytes()).unwrap();
        let artifact = train(&dataset, &small_params()).unwrap();

        let summary = artifact.training.as_ref().unwrap();
        assert_eq!(summary.rows, 48);
        assert_eq!(summary.positives, dataset.positives());
        assert!(summary.training_accuracy > 0.9);
        assert_eq!(artifact.forest.n_estimators(), 20);

        let total: f64 = artifact.feature_importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_training_and_inference_share_encoding() {
        let dataset = Dataset::from_reader(synthetic_csv().as_bytes()).unwrap();
        let artifact = train(&dataset, &small_params()).unwrap();

        // A record scored through infer sees the same vector training used
        for record in dataset.records().iter().take(5) {
            let via_infer = infer(&record.input, &artifact).unwrap();
            assert_eq!(
                via_infer.probability,
                artifact.predict_proba(&record.features)
            );
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let dataset = Dataset::from_reader(synthetic_csv().as_bytes()).unwrap();

        let first = train(&dataset, &small_params()).unwrap();
        let second = train(&dataset, &small_params()).unwrap();

        assert_eq!(first.forest, second.forest);
        assert_ne!(first.model_id, second.model_id);
    }

    #[test]
    fn test_single_class_rejected() {
        let text = format!(
            "{HEADER}\nt,45,Male,x,Yes,r,170,80,38,Yes,4-8 hours,No,a,b,c,d,No\nt,50,Female,x,Yes,r,160,60,30,Yes,4-8 hours,No,a,b,c,d,No"
        );
        let dataset = Dataset::from_reader(text.as_bytes()).unwrap();
        assert!(matches!(
            train(&dataset, &small_params()),
            Err(RiskError::Training(_))
        ));
    }

    #[test]
    fn test_train_from_path_writes_artifact() {
        let dir = std::env::temp_dir().join(format!("thinfat-risk-train-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let data_path = dir.join("data.csv");
        let model_path = dir.join("models").join("risk_model.json");
        std::fs::write(&data_path, synthetic_csv()).unwrap();

        let artifact = train_from_path(&data_path, &model_path, &small_params()).unwrap();
        let loaded = ModelArtifact::load(&model_path).unwrap();
        assert_eq!(loaded.model_id, artifact.model_id);

        let input = ScreeningInput {
            age: 35,
            gender: Gender::Male,
            height_cm: 170.0,
            weight_kg: 70.0,
            waist_inches: 32.0,
            sitting_hours_band: SittingBand::Medium,
            meets_activity_guideline: true,
        };
        assert_eq!(
            infer(&input, &loaded).unwrap(),
            infer(&input, &artifact).unwrap()
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
