//! Serialized feature scalers.

use serde::{Deserialize, Serialize};

use crate::features::domain::FeatureVector;

use super::domain::Scaler;

/// On-disk scaler envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub transform: Transform,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// `(x - mean) / scale`; a zero scale leaves the centred value untouched.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// `x * scale + min`.
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

impl ScalerArtifact {
    pub fn new(transform: Transform) -> Self {
        Self {
            feature_names: None,
            transform,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (offset, scale) = match &self.transform {
            Transform::Standard { mean, scale } => (mean, scale),
            Transform::MinMax { min, scale } => (min, scale),
        };
        if scale.is_empty() {
            return Err("scaler has no columns".into());
        }
        if offset.len() != scale.len() {
            return Err(format!(
                "scaler offset has {} columns, scale has {}",
                offset.len(),
                scale.len()
            ));
        }
        if scale.iter().chain(offset).any(|v| !v.is_finite()) {
            return Err("scaler parameters must be finite".into());
        }
        if let Some(names) = &self.feature_names {
            if names.len() != scale.len() {
                return Err(format!(
                    "{} feature names for {} columns",
                    names.len(),
                    scale.len()
                ));
            }
        }
        Ok(())
    }
}

impl Scaler for ScalerArtifact {
    fn n_features(&self) -> usize {
        match &self.transform {
            Transform::Standard { scale, .. } | Transform::MinMax { scale, .. } => scale.len(),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let x = features.as_slice();
        let out = match &self.transform {
            Transform::Standard { mean, scale } => x
                .iter()
                .zip(mean.iter().zip(scale))
                .map(|(v, (m, s))| {
                    let s = if *s == 0.0 { 1.0 } else { *s };
                    (v - m) / s
                })
                .collect(),
            Transform::MinMax { min, scale } => x
                .iter()
                .zip(min.iter().zip(scale))
                .map(|(v, (lo, s))| v * s + lo)
                .collect(),
        };
        FeatureVector::new(out)
    }
}
