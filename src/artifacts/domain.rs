//! Capability contracts for pre-fitted artefacts and the store serving them.
//!
//! Artefacts are fitted elsewhere; this crate only loads and applies them.

use std::fmt;

use serde::Serialize;

use crate::common::error::PredictResult;
use crate::features::domain::FeatureVector;
use crate::inference::domain::Flow;

/// Which half of a flow's artefact pair is being handled.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Classifier,
    Scaler,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Classifier => "classifier",
            ArtifactKind::Scaler => "scaler",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-fitted classifier mapping a feature vector to a class label.
pub trait Classifier {
    /// Number of input columns the classifier was fitted on.
    fn n_features(&self) -> usize;

    /// Column names recorded at fit time, if any.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict the class label. Callers guarantee `features.len() == n_features()`.
    fn predict(&self, features: &FeatureVector) -> i64;
}

/// Pre-fitted feature transform applied ahead of a classifier.
pub trait Scaler {
    fn n_features(&self) -> usize;

    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Callers guarantee `features.len() == n_features()`.
    fn transform(&self, features: &FeatureVector) -> FeatureVector;
}

/// Everything one prediction needs, freshly loaded.
pub struct FlowArtifacts {
    pub classifier: Box<dyn Classifier>,
    pub scaler: Option<Box<dyn Scaler>>,
}

impl fmt::Debug for FlowArtifacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowArtifacts")
            .field("classifier_features", &self.classifier.n_features())
            .field("scaler_features", &self.scaler.as_ref().map(|s| s.n_features()))
            .finish()
    }
}

/// Read-only source of artefacts, one set per flow.
///
/// Implementations must not cache across calls: every prediction sees the
/// artefacts as they are on the backing store at that moment.
pub trait ArtifactStore {
    fn load(&self, flow: Flow) -> PredictResult<FlowArtifacts>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for &S {
    fn load(&self, flow: Flow) -> PredictResult<FlowArtifacts> {
        (**self).load(flow)
    }
}
