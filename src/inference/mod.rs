//! Inference domain: per-flow prediction pipelines.

pub mod domain;
pub mod service;

pub use domain::{Flow, FlowRequest, Prediction, Tone, Verdict};
pub use service::Predictor;
