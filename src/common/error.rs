//! Error handling primitives shared across the core.
//!
//! Every failure aborts the single prediction it belongs to; callers decide
//! how to surface it.

use std::path::PathBuf;

use crate::artifacts::domain::ArtifactKind;
use crate::inference::domain::Flow;

/// Stable error codes that cross the FFI boundary.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PredictCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Model or scaler artefact missing or corrupt.
    ArtifactLoad = 1,
    /// Uploaded image could not be decoded.
    ImageDecode = 2,
    /// Feature vector disagrees with the artefact's expected input.
    SchemaMismatch = 3,
    /// Input failed validation.
    InvalidInput = 4,
    /// Runtime configuration could not be parsed.
    Config = 5,
}

/// Canonical error type for the core.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("failed to load {kind} artefact for {flow} from {}: {reason}", path.display())]
    ArtifactLoad {
        flow: Flow,
        kind: ArtifactKind,
        path: PathBuf,
        reason: String,
    },

    #[error("could not decode uploaded image: {0}")]
    ImageDecode(#[source] image::ImageError),

    #[error("{flow} input does not match the {stage}: {detail}")]
    SchemaMismatch {
        flow: Flow,
        stage: &'static str,
        detail: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result alias used throughout the crate.
pub type PredictResult<T> = Result<T, PredictError>;

impl PredictError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> PredictCode {
        match self {
            Self::ArtifactLoad { .. } => PredictCode::ArtifactLoad,
            Self::ImageDecode(_) => PredictCode::ImageDecode,
            Self::SchemaMismatch { .. } => PredictCode::SchemaMismatch,
            Self::InvalidInput(_) => PredictCode::InvalidInput,
            Self::Config(_) => PredictCode::Config,
        }
    }

    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Artefact helper used by the filesystem store and by structural checks.
    pub fn artifact(
        flow: Flow,
        kind: ArtifactKind,
        path: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ArtifactLoad {
            flow,
            kind,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Schema mismatch helper.
    pub fn schema(flow: Flow, stage: &'static str, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            flow,
            stage,
            detail: detail.into(),
        }
    }
}
