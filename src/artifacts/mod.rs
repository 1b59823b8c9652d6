//! Model artefact store: deserialises fitted classifiers and scalers per flow.

pub mod domain;
pub mod estimators;
pub mod repo_fs;
pub mod scalers;

pub use domain::{ArtifactKind, ArtifactStore, Classifier, FlowArtifacts, Scaler};
pub use estimators::{ClassifierArtifact, Estimator};
pub use repo_fs::FsArtifactStore;
pub use scalers::{ScalerArtifact, Transform};
