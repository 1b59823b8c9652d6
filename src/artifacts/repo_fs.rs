//! Filesystem store for fitted artefacts.
//!
//! Files are read and parsed on every call; nothing is cached between predictions.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::common::config::{AppCfg, ArtifactLayout};
use crate::common::error::{PredictError, PredictResult};
use crate::inference::domain::Flow;

use super::domain::{ArtifactKind, ArtifactStore, FlowArtifacts, Scaler};
use super::estimators::ClassifierArtifact;
use super::scalers::ScalerArtifact;

/// Serve artefacts from JSON files under `cfg.data_root`.
pub struct FsArtifactStore {
    root: PathBuf,
    layout: ArtifactLayout,
}

impl FsArtifactStore {
    pub fn new(cfg: &AppCfg) -> Self {
        Self {
            root: cfg.data_root.clone(),
            layout: cfg.layout.clone(),
        }
    }

    /// Absolute location of one artefact, if the flow has it.
    pub fn artifact_path(&self, flow: Flow, kind: ArtifactKind) -> Option<PathBuf> {
        let relative = match kind {
            ArtifactKind::Classifier => Some(self.layout.model_path(flow)),
            ArtifactKind::Scaler => self.layout.scaler_path(flow),
        };
        relative.map(|p| self.root.join(p))
    }

    pub fn load_classifier(&self, flow: Flow) -> PredictResult<ClassifierArtifact> {
        let path = self.root.join(self.layout.model_path(flow));
        let model: ClassifierArtifact = read_json(flow, ArtifactKind::Classifier, &path)?;
        model
            .validate()
            .map_err(|e| corrupt(flow, ArtifactKind::Classifier, &path, e))?;
        Ok(model)
    }

    pub fn load_scaler(&self, flow: Flow) -> PredictResult<Option<ScalerArtifact>> {
        let Some(relative) = self.layout.scaler_path(flow) else {
            return Ok(None);
        };
        let path = self.root.join(relative);
        let scaler: ScalerArtifact = read_json(flow, ArtifactKind::Scaler, &path)?;
        scaler
            .validate()
            .map_err(|e| corrupt(flow, ArtifactKind::Scaler, &path, e))?;
        Ok(Some(scaler))
    }
}

fn corrupt(flow: Flow, kind: ArtifactKind, path: &Path, detail: impl std::fmt::Display) -> PredictError {
    PredictError::artifact(flow, kind, path, format!("corrupt: {detail}"))
}

fn read_json<T: DeserializeOwned>(flow: Flow, kind: ArtifactKind, path: &Path) -> PredictResult<T> {
    debug!(ev = "artifact_load", flow = %flow, kind = %kind, path = %path.display());
    let bytes = fs::read(path).map_err(|err| {
        let reason = match err.kind() {
            io::ErrorKind::NotFound => "file not found".to_string(),
            _ => err.to_string(),
        };
        PredictError::artifact(flow, kind, path, reason)
    })?;
    serde_json::from_slice(&bytes).map_err(|err| corrupt(flow, kind, path, err))
}

impl ArtifactStore for FsArtifactStore {
    fn load(&self, flow: Flow) -> PredictResult<FlowArtifacts> {
        let classifier = self.load_classifier(flow)?;
        let scaler = self.load_scaler(flow)?;
        Ok(FlowArtifacts {
            classifier: Box::new(classifier),
            scaler: scaler.map(|s| Box::new(s) as Box<dyn Scaler>),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::domain::Classifier;
    use crate::artifacts::estimators::{Estimator, LinearModel};
    use crate::artifacts::scalers::Transform;
    use crate::common::error::PredictCode;

    fn store(root: &Path) -> FsArtifactStore {
        FsArtifactStore::new(&AppCfg::default().with_data_root(root))
    }

    fn write(root: &Path, relative: &str, body: &[u8]) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn linear(width: usize) -> Vec<u8> {
        serde_json::to_vec(&ClassifierArtifact::new(Estimator::LogisticRegression(LinearModel {
            coef: vec![0.1; width],
            intercept: 0.0,
            classes: vec![0, 1],
        })))
        .unwrap()
    }

    #[test]
    fn heart_flow_loads_without_scaler() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "models/heart_disease.json", &linear(13));

        let artifacts = store(dir.path()).load(Flow::Heart).unwrap();
        assert_eq!(artifacts.classifier.n_features(), 13);
        assert!(artifacts.scaler.is_none());
    }

    #[test]
    fn diabetes_flow_requires_its_scaler() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "models/diabetes_model.json", &linear(8));

        let err = store(dir.path()).load(Flow::Diabetes).unwrap_err();
        assert_eq!(err.code(), PredictCode::ArtifactLoad);
        assert!(err.to_string().contains("scaler"));
        assert!(err.to_string().contains("file not found"));

        let scaler = ScalerArtifact::new(Transform::Standard {
            mean: vec![0.0; 8],
            scale: vec![1.0; 8],
        });
        write(
            dir.path(),
            "models/scaler_diabete.json",
            &serde_json::to_vec(&scaler).unwrap(),
        );
        let artifacts = store(dir.path()).load(Flow::Diabetes).unwrap();
        assert_eq!(artifacts.scaler.map(|s| s.n_features()), Some(8));
    }

    #[test]
    fn unparsable_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "models/heart_disease.json", b"\x80\x04\x95pickle");

        let err = store(dir.path()).load(Flow::Heart).unwrap_err();
        assert_eq!(err.code(), PredictCode::ArtifactLoad);
        assert!(err.to_string().contains("corrupt"));
    }

    #[test]
    fn structurally_broken_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "models/heart_disease.json",
            br#"{"estimator": {"kind": "logistic_regression", "coef": [], "intercept": 0.0}}"#,
        );
        let err = store(dir.path()).load(Flow::Heart).unwrap_err();
        assert!(err.to_string().contains("corrupt: linear model has no coefficients"));
    }

    #[test]
    fn paths_follow_layout() {
        let s = store(Path::new("/data"));
        assert_eq!(
            s.artifact_path(Flow::Covid, ArtifactKind::Scaler),
            Some(PathBuf::from("/data/scaler_covid/scaler.json"))
        );
        assert_eq!(s.artifact_path(Flow::Heart, ArtifactKind::Scaler), None);
    }
}
