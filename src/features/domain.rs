//! Input and feature definitions for the tabular flows.
//!
//! Field order in each [`FeatureSchema`] is the column order the fitted
//! artefacts were trained on. Bounds describe the input widgets; the
//! prediction pipeline itself never enforces them.

use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};

/// Ordered numeric representation of one request, as fed to a model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Biological sex as offered by the heart form.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    pub fn encode(self) -> f64 {
        match self {
            Sex::Male => 1.0,
            Sex::Female => 0.0,
        }
    }
}

/// Binary flag rendered as Yes/No.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum YesNo {
    #[default]
    Yes,
    No,
}

impl YesNo {
    pub fn encode(self) -> f64 {
        match self {
            YesNo::Yes => 1.0,
            YesNo::No => 0.0,
        }
    }
}

/// Widget-level description of a single input field.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Int { min: i64, max: i64, default: i64 },
    Float { min: f64, max: f64, step: f64, default: f64 },
    Choice { options: [&'static str; 2] },
}

/// One named, bounded input.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn int(name: &'static str, label: &'static str, min: i64, max: i64, default: i64) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Int { min, max, default },
        }
    }

    const fn float(
        name: &'static str,
        label: &'static str,
        min: f64,
        max: f64,
        step: f64,
        default: f64,
    ) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Float {
                min,
                max,
                step,
                default,
            },
        }
    }

    const fn choice(name: &'static str, label: &'static str, options: [&'static str; 2]) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Choice { options },
        }
    }

    /// Whether an encoded value lies within the widget's range.
    pub fn accepts(&self, value: f64) -> bool {
        match self.kind {
            FieldKind::Int { min, max, .. } => {
                value.fract() == 0.0 && value >= min as f64 && value <= max as f64
            }
            FieldKind::Float { min, max, .. } => value >= min && value <= max,
            FieldKind::Choice { .. } => value == 0.0 || value == 1.0,
        }
    }
}

/// Ordered field list for one tabular flow.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct FeatureSchema {
    pub fields: &'static [FieldSpec],
}

pub static HEART_SCHEMA: FeatureSchema = FeatureSchema {
    fields: &[
        FieldSpec::int("age", "Age", 1, 80, 30),
        FieldSpec::choice("sex", "Sex", ["Male", "Female"]),
        FieldSpec::int("chest_pain_type", "Chest Pain Type (0-3)", 0, 3, 0),
        FieldSpec::int("resting_bp", "Resting Blood Pressure", 80, 200, 120),
        FieldSpec::int("cholesterol", "Serum Cholesterol in mg/dl", 100, 600, 200),
        FieldSpec::choice("fasting_blood_sugar", "Fasting Blood Sugar > 120 mg/dl", ["Yes", "No"]),
        FieldSpec::int("resting_ecg", "Resting Electrocardiographic Results (0-2)", 0, 2, 0),
        FieldSpec::int("max_heart_rate", "Maximum Heart Rate Achieved", 60, 220, 150),
        FieldSpec::choice("exercise_angina", "Exercise Induced Angina", ["Yes", "No"]),
        FieldSpec::float("st_depression", "ST Depression Induced by Exercise", 0.0, 10.0, 0.1, 0.0),
        FieldSpec::int("st_slope", "Slope of the Peak Exercise ST Segment (0-2)", 0, 2, 0),
        FieldSpec::int("vessels_colored", "Number of Major Vessels Colored by Fluoroscopy (0-4)", 0, 4, 0),
        FieldSpec::int("thalassemia", "Thalassemia (1-3)", 1, 3, 2),
    ],
};

pub static DIABETES_SCHEMA: FeatureSchema = FeatureSchema {
    fields: &[
        FieldSpec::int("pregnancies", "Number of Pregnancies", 0, 20, 0),
        FieldSpec::int("glucose", "Glucose Level", 0, 200, 0),
        FieldSpec::int("blood_pressure", "Blood Pressure", 0, 200, 0),
        FieldSpec::int("skin_thickness", "Skin Thickness", 0, 100, 0),
        FieldSpec::int("insulin", "Insulin Level", 0, 900, 0),
        FieldSpec::float("bmi", "BMI", 0.0, 100.0, 0.01, 0.0),
        FieldSpec::float("diabetes_pedigree_function", "Diabetes Pedigree Function", 0.0, 3.0, 0.01, 0.0),
        FieldSpec::int("age", "Age", 0, 120, 0),
    ],
};

impl FeatureSchema {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in model column order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Check an encoded vector against the widget bounds.
    ///
    /// Intended for shells that accept free-form input; the pipeline does not call it.
    pub fn check_bounds(&self, vector: &FeatureVector) -> PredictResult<()> {
        if vector.len() != self.len() {
            return Err(PredictError::invalid(format!(
                "expected {} values, got {}",
                self.len(),
                vector.len()
            )));
        }
        for (field, value) in self.fields.iter().zip(vector.as_slice()) {
            if !field.accepts(*value) {
                return Err(PredictError::invalid(format!(
                    "{} = {} is outside the accepted range",
                    field.name, value
                )));
            }
        }
        Ok(())
    }
}

/// Heart form input. Field names double as the JSON keys of a raw request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartInput {
    pub age: u32,
    pub sex: Sex,
    pub chest_pain_type: u32,
    pub resting_bp: u32,
    pub cholesterol: u32,
    pub fasting_blood_sugar: YesNo,
    pub resting_ecg: u32,
    pub max_heart_rate: u32,
    pub exercise_angina: YesNo,
    pub st_depression: f64,
    pub st_slope: u32,
    pub vessels_colored: u32,
    pub thalassemia: u32,
}

impl Default for HeartInput {
    fn default() -> Self {
        Self {
            age: 30,
            sex: Sex::Male,
            chest_pain_type: 0,
            resting_bp: 120,
            cholesterol: 200,
            fasting_blood_sugar: YesNo::Yes,
            resting_ecg: 0,
            max_heart_rate: 150,
            exercise_angina: YesNo::Yes,
            st_depression: 0.0,
            st_slope: 0,
            vessels_colored: 0,
            thalassemia: 2,
        }
    }
}

/// Diabetes form input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiabetesInput {
    pub pregnancies: u32,
    pub glucose: u32,
    pub blood_pressure: u32,
    pub skin_thickness: u32,
    pub insulin: u32,
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    pub age: u32,
}
