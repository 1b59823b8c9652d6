//! Feature vector builders for the tabular flows.

use super::domain::{DiabetesInput, FeatureVector, HeartInput};

/// Encode a heart form into the 13-column order of `HEART_SCHEMA`.
pub fn heart_vector(input: &HeartInput) -> FeatureVector {
    FeatureVector::new(vec![
        f64::from(input.age),
        input.sex.encode(),
        f64::from(input.chest_pain_type),
        f64::from(input.resting_bp),
        f64::from(input.cholesterol),
        input.fasting_blood_sugar.encode(),
        f64::from(input.resting_ecg),
        f64::from(input.max_heart_rate),
        input.exercise_angina.encode(),
        input.st_depression,
        f64::from(input.st_slope),
        f64::from(input.vessels_colored),
        f64::from(input.thalassemia),
    ])
}

/// Encode a diabetes form into the 8-column order of `DIABETES_SCHEMA`.
pub fn diabetes_vector(input: &DiabetesInput) -> FeatureVector {
    FeatureVector::new(vec![
        f64::from(input.pregnancies),
        f64::from(input.glucose),
        f64::from(input.blood_pressure),
        f64::from(input.skin_thickness),
        f64::from(input.insulin),
        input.bmi,
        input.diabetes_pedigree_function,
        f64::from(input.age),
    ])
}
