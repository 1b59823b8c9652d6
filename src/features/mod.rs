//! Feature domain: typed form inputs, schemas and the image extractor.

pub mod domain;
pub mod image;
pub mod service;

pub use domain::{DiabetesInput, FeatureSchema, FeatureVector, HeartInput, Sex, YesNo};
