// lib.rs - multiple disease prediction core
pub mod api;
pub mod artifacts;
pub mod common;
pub mod features;
pub mod inference;

pub use common::{PredictCode, PredictError, PredictResult};
pub use inference::{Flow, FlowRequest, Prediction, Predictor, Verdict};
