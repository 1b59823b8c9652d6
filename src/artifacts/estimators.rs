//! Serialized classifier artefacts and their prediction rules.
//!
//! Parameters mirror the attributes of the fitted estimators they were
//! exported from: linear coefficients, flat tree node arrays, or the stored
//! training samples of a nearest-neighbour model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::domain::FeatureVector;

use super::domain::Classifier;

fn binary_classes() -> Vec<i64> {
    vec![0, 1]
}

/// On-disk classifier envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub estimator: Estimator,
}

/// Supported estimator families.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LinearModel),
    LinearSvm(LinearModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    KNearest(KNearest),
}

/// Linear decision function `coef · x + intercept`; positive selects `classes[1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
}

impl LinearModel {
    pub fn decision(&self, x: &[f64]) -> f64 {
        self.coef.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + self.intercept
    }

    fn predict(&self, x: &[f64]) -> i64 {
        if self.decision(x) > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.coef.is_empty() {
            return Err("linear model has no coefficients".into());
        }
        if self.classes.len() != 2 {
            return Err(format!(
                "linear model must have 2 classes, found {}",
                self.classes.len()
            ));
        }
        Ok(())
    }
}

/// Flat node arrays of a fitted tree. `children_left[i] == -1` marks a leaf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeNodes {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights (counts or fractions).
    pub value: Vec<Vec<f64>>,
}

impl TreeNodes {
    /// Normalised class distribution at the leaf reached by `x`.
    fn leaf_distribution(&self, x: &[f64]) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] >= 0 {
            let column = self.feature[node] as usize;
            node = if x[column] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        let weights = &self.value[node];
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / weights.len() as f64; weights.len()]
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let nodes = self.children_left.len();
        if nodes == 0 {
            return Err("tree has no nodes".into());
        }
        if self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err("tree node arrays differ in length".into());
        }
        for i in 0..nodes {
            if self.value[i].len() != n_classes {
                return Err(format!("node {i} has {} class weights", self.value[i].len()));
            }
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left < 0 {
                continue;
            }
            // Children always follow their parent, which also rules out cycles.
            let child_ok = |c: i64| c > i as i64 && (c as usize) < nodes;
            if !child_ok(left) || !child_ok(right) {
                return Err(format!("node {i} has dangling children"));
            }
            let column = self.feature[i];
            if column < 0 || column as usize >= n_features {
                return Err(format!("node {i} splits on unknown column {column}"));
            }
        }
        Ok(())
    }
}

fn argmax(probabilities: &[f64]) -> usize {
    let mut best = 0;
    for (idx, p) in probabilities.iter().enumerate() {
        if *p > probabilities[best] {
            best = idx;
        }
    }
    best
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
    pub tree: TreeNodes,
}

/// Forest voting by averaged leaf distributions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    #[serde(default = "binary_classes")]
    pub classes: Vec<i64>,
    pub trees: Vec<TreeNodes>,
}

impl RandomForest {
    fn predict(&self, x: &[f64]) -> i64 {
        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.leaf_distribution(x)) {
                *acc += p;
            }
        }
        self.classes[argmax(&sum)]
    }
}

/// Uniform-weight k-nearest-neighbour vote under Euclidean distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KNearest {
    pub k: usize,
    pub samples: Vec<Vec<f64>>,
    pub labels: Vec<i64>,
}

impl KNearest {
    fn predict(&self, x: &[f64]) -> i64 {
        let mut distances: Vec<(f64, usize)> = self
            .samples
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let d = s.iter().zip(x).map(|(a, b)| (a - b) * (a - b)).sum::<f64>();
                (d, idx)
            })
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for (_, idx) in distances.iter().take(self.k) {
            *votes.entry(self.labels[*idx]).or_default() += 1;
        }
        // BTreeMap iterates labels ascending, so ties resolve to the lower label.
        let mut winner = (0, 0);
        for (label, count) in votes {
            if count > winner.1 {
                winner = (label, count);
            }
        }
        winner.0
    }

    fn validate(&self) -> Result<(), String> {
        if self.k == 0 {
            return Err("k must be positive".into());
        }
        let Some(first) = self.samples.first() else {
            return Err("no stored samples".into());
        };
        if first.is_empty() || self.samples.iter().any(|s| s.len() != first.len()) {
            return Err("stored samples differ in width".into());
        }
        if self.labels.len() != self.samples.len() {
            return Err(format!(
                "{} labels for {} samples",
                self.labels.len(),
                self.samples.len()
            ));
        }
        if self.k > self.samples.len() {
            return Err(format!(
                "k = {} exceeds the {} stored samples",
                self.k,
                self.samples.len()
            ));
        }
        Ok(())
    }
}

impl ClassifierArtifact {
    pub fn new(estimator: Estimator) -> Self {
        Self {
            feature_names: None,
            estimator,
        }
    }

    pub fn with_feature_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Structural consistency of the parameters; a failure means the file is corrupt.
    pub fn validate(&self) -> Result<(), String> {
        match &self.estimator {
            Estimator::LogisticRegression(m) | Estimator::LinearSvm(m) => m.validate()?,
            Estimator::DecisionTree(t) => {
                if t.classes.is_empty() {
                    return Err("tree has no classes".into());
                }
                t.tree.validate(t.n_features, t.classes.len())?
            }
            Estimator::RandomForest(f) => {
                if f.trees.is_empty() {
                    return Err("forest has no trees".into());
                }
                if f.classes.is_empty() {
                    return Err("forest has no classes".into());
                }
                for tree in &f.trees {
                    tree.validate(f.n_features, f.classes.len())?;
                }
            }
            Estimator::KNearest(k) => k.validate()?,
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features() {
                return Err(format!(
                    "{} feature names for {} columns",
                    names.len(),
                    self.n_features()
                ));
            }
        }
        Ok(())
    }
}

impl Classifier for ClassifierArtifact {
    fn n_features(&self) -> usize {
        match &self.estimator {
            Estimator::LogisticRegression(m) | Estimator::LinearSvm(m) => m.coef.len(),
            Estimator::DecisionTree(t) => t.n_features,
            Estimator::RandomForest(f) => f.n_features,
            Estimator::KNearest(k) => k.samples.first().map_or(0, Vec::len),
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, features: &FeatureVector) -> i64 {
        let x = features.as_slice();
        match &self.estimator {
            Estimator::LogisticRegression(m) | Estimator::LinearSvm(m) => m.predict(x),
            Estimator::DecisionTree(t) => t.classes[argmax(&t.tree.leaf_distribution(x))],
            Estimator::RandomForest(f) => f.predict(x),
            Estimator::KNearest(k) => k.predict(x),
        }
    }
}
