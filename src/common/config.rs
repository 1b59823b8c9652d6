//! Runtime configuration loaded from the process environment.
//!
//! Artefact paths are logical: they resolve under `data_root` unless an
//! override variable supplies a path of its own.

use std::env;
use std::path::{Path, PathBuf};

use crate::common::error::{PredictError, PredictResult};
use crate::features::image::ResizeFilter;
use crate::inference::domain::Flow;

/// Relative locations of every artefact file, one set per flow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArtifactLayout {
    pub heart_model: PathBuf,
    pub diabetes_model: PathBuf,
    pub diabetes_scaler: PathBuf,
    pub covid_model: PathBuf,
    pub covid_scaler: PathBuf,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            heart_model: PathBuf::from("models/heart_disease.json"),
            diabetes_model: PathBuf::from("models/diabetes_model.json"),
            diabetes_scaler: PathBuf::from("models/scaler_diabete.json"),
            covid_model: PathBuf::from("models/new_model1.json"),
            covid_scaler: PathBuf::from("scaler_covid/scaler.json"),
        }
    }
}

impl ArtifactLayout {
    /// Classifier path for a flow, relative to the data root.
    pub fn model_path(&self, flow: Flow) -> &Path {
        match flow {
            Flow::Heart => &self.heart_model,
            Flow::Diabetes => &self.diabetes_model,
            Flow::Covid => &self.covid_model,
        }
    }

    /// Scaler path for flows trained with one.
    pub fn scaler_path(&self, flow: Flow) -> Option<&Path> {
        match flow {
            Flow::Heart => None,
            Flow::Diabetes => Some(&self.diabetes_scaler),
            Flow::Covid => Some(&self.covid_scaler),
        }
    }
}

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub data_root: PathBuf,
    pub log_level: String,
    pub resize_filter: ResizeFilter,
    pub layout: ArtifactLayout,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            log_level: "info".to_string(),
            resize_filter: ResizeFilter::default(),
            layout: ArtifactLayout::default(),
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> PredictResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> PredictResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let path_or = |key: &str, default: PathBuf| lookup(key).map(PathBuf::from).unwrap_or(default);

        let resize_filter = env_or("MEDPREDICT_RESIZE_FILTER", "catmullrom")
            .parse::<ResizeFilter>()
            .map_err(PredictError::Config)?;

        let defaults = ArtifactLayout::default();
        let layout = ArtifactLayout {
            heart_model: path_or("MEDPREDICT_HEART_MODEL", defaults.heart_model),
            diabetes_model: path_or("MEDPREDICT_DIABETES_MODEL", defaults.diabetes_model),
            diabetes_scaler: path_or("MEDPREDICT_DIABETES_SCALER", defaults.diabetes_scaler),
            covid_model: path_or("MEDPREDICT_COVID_MODEL", defaults.covid_model),
            covid_scaler: path_or("MEDPREDICT_COVID_SCALER", defaults.covid_scaler),
        };

        Ok(Self {
            data_root: PathBuf::from(env_or("MEDPREDICT_DATA_ROOT", ".")),
            log_level: env_or("MEDPREDICT_LOG_LEVEL", "info"),
            resize_filter,
            layout,
        })
    }

    /// Same snapshot rooted somewhere else.
    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = root.into();
        self
    }
}
