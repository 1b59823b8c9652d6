//! Domain definitions for prediction requests, verdicts and results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};
use crate::features::domain::{
    DiabetesInput, FeatureSchema, HeartInput, DIABETES_SCHEMA, HEART_SCHEMA,
};
use crate::features::image::IMAGE_FEATURES;

/// One of the independent prediction use-cases.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Heart,
    Diabetes,
    Covid,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Heart => "heart",
            Flow::Diabetes => "diabetes",
            Flow::Covid => "covid",
        }
    }

    /// Whether the flow's classifier was trained on scaled inputs.
    pub fn uses_scaler(&self) -> bool {
        !matches!(self, Flow::Heart)
    }

    /// Named input fields for the tabular flows.
    pub fn schema(&self) -> Option<&'static FeatureSchema> {
        match self {
            Flow::Heart => Some(&HEART_SCHEMA),
            Flow::Diabetes => Some(&DIABETES_SCHEMA),
            Flow::Covid => None,
        }
    }

    /// Width of the feature vector the flow produces.
    pub fn feature_width(&self) -> usize {
        match self.schema() {
            Some(schema) => schema.len(),
            None => IMAGE_FEATURES,
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Flow {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heart" => Ok(Flow::Heart),
            "diabetes" => Ok(Flow::Diabetes),
            "covid" => Ok(Flow::Covid),
            other => Err(PredictError::invalid(format!("unknown flow '{other}'"))),
        }
    }
}

/// How a shell should present a verdict.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Error,
    Success,
    Plain,
}

/// Closed set of outcomes, one pair per flow.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    HeartDisease,
    HealthyHeart,
    NoDiabetes,
    Diabetes,
    CovidDetected,
    NoCovid,
}

impl Verdict {
    /// Map a predicted label to the flow's verdict.
    ///
    /// Heart keys on `1`; diabetes and COVID key on `0`. For COVID that means
    /// label `0` reads as "detected", which is how the fitted model's classes
    /// were published.
    pub fn for_label(flow: Flow, label: i64) -> Self {
        match flow {
            Flow::Heart if label == 1 => Verdict::HeartDisease,
            Flow::Heart => Verdict::HealthyHeart,
            Flow::Diabetes if label == 0 => Verdict::NoDiabetes,
            Flow::Diabetes => Verdict::Diabetes,
            Flow::Covid if label == 0 => Verdict::CovidDetected,
            Flow::Covid => Verdict::NoCovid,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Verdict::HeartDisease => "Detected Heart Disease",
            Verdict::HealthyHeart => "Healthy Heart",
            Verdict::NoDiabetes => "Do not worry, there is no diabetes.",
            Verdict::Diabetes => "Unfortunately, there is diabetes.",
            Verdict::CovidDetected => "Result: COVID-19 detected.",
            Verdict::NoCovid => "Result: No COVID-19 detected.",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Verdict::HeartDisease => Tone::Error,
            Verdict::HealthyHeart => Tone::Success,
            _ => Tone::Plain,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// One user submission.
#[derive(Clone, Debug, PartialEq)]
pub enum FlowRequest {
    Heart(HeartInput),
    Diabetes(DiabetesInput),
    Covid { image: Vec<u8> },
}

impl FlowRequest {
    pub fn flow(&self) -> Flow {
        match self {
            FlowRequest::Heart(_) => Flow::Heart,
            FlowRequest::Diabetes(_) => Flow::Diabetes,
            FlowRequest::Covid { .. } => Flow::Covid,
        }
    }

    /// Parse a JSON field mapping for one of the tabular flows.
    pub fn from_json(flow: Flow, raw: &str) -> PredictResult<Self> {
        let parse_err = |e: serde_json::Error| PredictError::invalid(format!("{flow} input: {e}"));
        match flow {
            Flow::Heart => Ok(FlowRequest::Heart(serde_json::from_str(raw).map_err(parse_err)?)),
            Flow::Diabetes => Ok(FlowRequest::Diabetes(
                serde_json::from_str(raw).map_err(parse_err)?,
            )),
            Flow::Covid => Err(PredictError::invalid(
                "the covid flow takes image bytes, not a field mapping",
            )),
        }
    }
}

/// Result of a single prediction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub flow: Flow,
    pub label: i64,
    pub verdict: Verdict,
    pub message: &'static str,
    pub tone: Tone,
    pub latency_ms: u32,
    /// Hash of the unscaled feature vector, for log correlation.
    pub fingerprint: String,
}

impl Prediction {
    pub fn new(flow: Flow, label: i64, latency_ms: u32, fingerprint: String) -> Self {
        let verdict = Verdict::for_label(flow, label);
        Self {
            flow,
            label,
            verdict,
            message: verdict.message(),
            tone: verdict.tone(),
            latency_ms,
            fingerprint,
        }
    }
}
