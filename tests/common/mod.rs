#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use medpredict::artifacts::estimators::{KNearest, LinearModel};
use medpredict::artifacts::{ClassifierArtifact, Estimator, FsArtifactStore, ScalerArtifact, Transform};
use medpredict::common::config::AppCfg;
use medpredict::features::image::ResizeFilter;
use medpredict::Predictor;
use tempfile::TempDir;

/// Artefact directory laid out like a deployment.
pub struct ArtifactDir {
    tmp: TempDir,
}

impl ArtifactDir {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn write_json<T: serde::Serialize>(&self, relative: &str, value: &T) -> PathBuf {
        self.write_raw(relative, &serde_json::to_vec_pretty(value).expect("serialize"))
    }

    pub fn write_raw(&self, relative: &str, body: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().expect("has parent")).expect("create dirs");
        fs::write(&path, body).expect("write artefact");
        path
    }

    pub fn predictor(&self) -> Predictor<FsArtifactStore> {
        let cfg = AppCfg::default().with_data_root(self.root());
        Predictor::new(FsArtifactStore::new(&cfg), ResizeFilter::default())
    }
}

/// Linear classifier whose decision is `sum(x) + intercept`.
pub fn summing_model(width: usize, intercept: f64) -> ClassifierArtifact {
    ClassifierArtifact::new(Estimator::LogisticRegression(LinearModel {
        coef: vec![1.0; width],
        intercept,
        classes: vec![0, 1],
    }))
}

/// Identity standard scaler.
pub fn identity_scaler(width: usize) -> ScalerArtifact {
    ScalerArtifact::new(Transform::Standard {
        mean: vec![0.0; width],
        scale: vec![1.0; width],
    })
}

/// Nearest-neighbour model separating dark images (label 0) from bright ones (label 1).
pub fn brightness_knn() -> ClassifierArtifact {
    ClassifierArtifact::new(Estimator::KNearest(KNearest {
        k: 1,
        samples: vec![vec![0.0; 784], vec![1.0; 784]],
        labels: vec![0, 1],
    }))
}

/// Scales pixel intensities into 0..=1.
pub fn pixel_scaler() -> ScalerArtifact {
    ScalerArtifact::new(Transform::MinMax {
        min: vec![0.0; 784],
        scale: vec![1.0 / 255.0; 784],
    })
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode image");
    out.into_inner()
}
