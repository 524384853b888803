//! Classifier adapter
//!
//! Wraps a trained probabilistic classifier and guarantees the shape of its
//! output: one probability per class, all finite, summing to 1 within
//! [`PROBABILITY_TOLERANCE`]. The predicted class is the arg-max of that
//! vector and the confidence is its maximum.
//!
//! Two model families can be carried by an artifact bundle:
//! - `forest`: random forest of classification trees
//! - `logistic`: multinomial logistic regression

pub mod forest;
pub mod logistic;

pub use forest::{ClassTree, ForestModel, Node};
pub use logistic::{softmax, LogisticModel};

use crate::errors::{CreditCoreError, Result};
use crate::features::FeatureVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Allowed deviation of the probability sum from 1
pub const PROBABILITY_TOLERANCE: f64 = 1e-5;

/// A classifier exposing class probabilities over a feature vector
pub trait ProbabilisticClassifier: Send + Sync + fmt::Debug {
    fn n_features(&self) -> usize;
    fn n_classes(&self) -> usize;
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>>;
}

/// Serialized classifier carried in `model.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    RandomForest(ForestModel),
    Logistic(LogisticModel),
}

impl ClassifierModel {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RandomForest(_) => "random_forest",
            Self::Logistic(_) => "logistic",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::RandomForest(m) => m.validate(),
            Self::Logistic(m) => m.validate(),
        }
    }
}

impl ProbabilisticClassifier for ClassifierModel {
    fn n_features(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_features(),
            Self::Logistic(m) => m.n_features(),
        }
    }

    fn n_classes(&self) -> usize {
        match self {
            Self::RandomForest(m) => m.n_classes(),
            Self::Logistic(m) => m.n_classes(),
        }
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        match self {
            Self::RandomForest(m) => m.predict_proba(features),
            Self::Logistic(m) => m.predict_proba(features),
        }
    }
}

/// Output of one classification
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label_code: usize,
    pub probabilities: Vec<f64>,
    pub confidence: f64,
}

/// Shape-checking wrapper around a shared classifier
#[derive(Debug, Clone)]
pub struct ClassifierAdapter {
    inner: Arc<dyn ProbabilisticClassifier>,
}

impl ClassifierAdapter {
    pub fn new(inner: Arc<dyn ProbabilisticClassifier>) -> Self {
        Self { inner }
    }

    pub fn n_features(&self) -> usize {
        self.inner.n_features()
    }

    pub fn n_classes(&self) -> usize {
        self.inner.n_classes()
    }

    /// Predict the class code and probability vector for one feature vector
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction> {
        if vector.len() != self.inner.n_features() {
            return Err(CreditCoreError::ClassificationFailed(format!(
                "classifier expects {} features, got {}",
                self.inner.n_features(),
                vector.len()
            )));
        }

        let probabilities = self.inner.predict_proba(vector.as_slice())?;
        check_probabilities(&probabilities, self.inner.n_classes())?;

        let (label_code, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (idx, p)| {
                if p > best.1 {
                    (idx, p)
                } else {
                    best
                }
            });

        Ok(Prediction {
            label_code,
            probabilities,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    /// Predicted class only
    pub fn predict_class(&self, vector: &FeatureVector) -> Result<usize> {
        self.predict(vector).map(|p| p.label_code)
    }
}

fn check_probabilities(probabilities: &[f64], n_classes: usize) -> Result<()> {
    if probabilities.len() != n_classes {
        return Err(CreditCoreError::ClassificationFailed(format!(
            "classifier returned {} probabilities for {} classes",
            probabilities.len(),
            n_classes
        )));
    }
    if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(CreditCoreError::ClassificationFailed(
            "classifier returned invalid probabilities".into(),
        ));
    }
    let total: f64 = probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(CreditCoreError::ClassificationFailed(format!(
            "class probabilities sum to {}",
            total
        )));
    }
    Ok(())
}
