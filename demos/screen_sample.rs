//! Train a small forest on synthetic survey rows and screen one person

use std::sync::Arc;
use thinfat_risk::dataset::Dataset;
use thinfat_risk::model::ForestParams;
use thinfat_risk::report::render_text;
use thinfat_risk::training::train;
use thinfat_risk::types::{Gender, ScreeningInput, SittingBand};
use thinfat_risk::RiskPredictor;

fn main() {
    let mut csv = String::from(
        "Timestamp,Age,Gender,Ethnicity,Employed,Role,Height,Weight,Waist_Inches,\
         Weight_Increase,Sitting_Hours,Physical_Activity,Fast_Food,Sugar_Intake,\
         Family_History,Blood_Pressure,Target\n",
    );
    for i in 0..40u32 {
        let high = i % 2 == 0;
        let (waist, sitting, activity, target) = if high {
            (36 + i % 5, "More than 8 hours", "No", 1)
        } else {
            (29 + i % 4, "Less than 4 hours", "Yes", 0)
        };
        csv.push_str(&format!(
            "t,{},{},South Asian,Yes,Staff,{},{},{},No,{},{},No,No,No,No,{}\n",
            25 + i,
            if i % 3 == 0 { "Female" } else { "Male" },
            160 + i % 15,
            60 + i % 20,
            waist,
            sitting,
            activity,
            target
        ));
    }

    let params = ForestParams {
        n_estimators: 25,
        ..ForestParams::default()
    };

    let result = Dataset::from_reader(csv.as_bytes())
        .and_then(|dataset| train(&dataset, &params))
        .and_then(|artifact| {
            let predictor = RiskPredictor::new(Arc::new(artifact));
            predictor.screen(&ScreeningInput {
                age: 45,
                gender: Gender::Male,
                height_cm: 170.0,
                weight_kg: 80.0,
                waist_inches: 38.0,
                sitting_hours_band: SittingBand::High,
                meets_activity_guideline: false,
            })
        });

    match result {
        Ok(screening) => print!("{}", render_text(&screening)),
        Err(e) => eprintln!("Error: {e}"),
    }
}
