//! Multinomial logistic regression (softmax over linear class scores)

use super::ProbabilisticClassifier;
use crate::errors::{CreditCoreError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticModel {
    pub n_features: usize,
    pub n_classes: usize,
    /// `coefficients[class][feature]`
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LogisticModel {
    pub fn validate(&self) -> Result<()> {
        if self.n_classes < 2 {
            return Err(CreditCoreError::ArtifactCorrupt(format!(
                "logistic model needs at least 2 classes, has {}",
                self.n_classes
            )));
        }
        if self.coefficients.len() != self.n_classes || self.intercepts.len() != self.n_classes {
            return Err(CreditCoreError::ArtifactCorrupt(format!(
                "logistic model has {} coefficient rows and {} intercepts for {} classes",
                self.coefficients.len(),
                self.intercepts.len(),
                self.n_classes
            )));
        }
        for (class, row) in self.coefficients.iter().enumerate() {
            if row.len() != self.n_features {
                return Err(CreditCoreError::ArtifactCorrupt(format!(
                    "class {} has {} coefficients, expected {}",
                    class,
                    row.len(),
                    self.n_features
                )));
            }
        }
        let all_finite = self
            .coefficients
            .iter()
            .flatten()
            .chain(self.intercepts.iter())
            .all(|w| w.is_finite());
        if !all_finite {
            return Err(CreditCoreError::ArtifactCorrupt(
                "logistic model has non-finite weights".into(),
            ));
        }
        Ok(())
    }

    /// Linear class scores before the softmax
    pub fn decision_function(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.n_features {
            return Err(CreditCoreError::ClassificationFailed(format!(
                "logistic model expects {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        Ok(self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect())
    }
}

/// Numerically stable softmax
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl ProbabilisticClassifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        Ok(softmax(&self.decision_function(features)?))
    }
}
