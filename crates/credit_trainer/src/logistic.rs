//! Multinomial logistic regression trainer
//!
//! Full-batch gradient descent on the mean cross-entropy with an L2 penalty
//! on the coefficients (intercepts are not penalised). Weights start at
//! zero, so training is deterministic without a seed.

use credit_core::classifier::softmax;
use credit_core::LogisticModel;
use tracing::{debug, info};

use crate::errors::{Result, TrainerError};

#[derive(Clone, Debug)]
pub struct LogisticConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.1,
            l2: 1e-4,
        }
    }
}

pub struct LogisticTrainer {
    config: LogisticConfig,
}

impl LogisticTrainer {
    pub fn new(config: LogisticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    pub fn train(
        &self,
        features: &[Vec<f64>],
        targets: &[usize],
        n_classes: usize,
    ) -> Result<LogisticModel> {
        if features.is_empty() || features.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "cannot fit logistic regression on {} rows with {} targets",
                features.len(),
                targets.len()
            )));
        }
        if !(self.config.learning_rate.is_finite() && self.config.learning_rate > 0.0) {
            return Err(TrainerError::Training(format!(
                "learning rate must be positive, got {}",
                self.config.learning_rate
            )));
        }

        let n_features = features[0].len();
        let n = features.len() as f64;
        let mut model = LogisticModel {
            n_features,
            n_classes,
            coefficients: vec![vec![0.0; n_features]; n_classes],
            intercepts: vec![0.0; n_classes],
        };
        info!(
            epochs = self.config.epochs,
            learning_rate = self.config.learning_rate,
            rows = features.len(),
            "training logistic regression"
        );

        for epoch in 0..self.config.epochs {
            let mut grad_w = vec![vec![0.0; n_features]; n_classes];
            let mut grad_b = vec![0.0; n_classes];
            let mut loss = 0.0;

            for (row, &target) in features.iter().zip(targets) {
                let probabilities = softmax(&model.decision_function(row)?);
                loss -= probabilities[target].max(f64::MIN_POSITIVE).ln();
                for (class, p) in probabilities.iter().enumerate() {
                    let error = p - if class == target { 1.0 } else { 0.0 };
                    grad_b[class] += error;
                    for (g, x) in grad_w[class].iter_mut().zip(row) {
                        *g += error * x;
                    }
                }
            }

            for class in 0..n_classes {
                for (w, g) in model.coefficients[class].iter_mut().zip(&grad_w[class]) {
                    *w -= self.config.learning_rate * (g / n + self.config.l2 * *w);
                }
                model.intercepts[class] -= self.config.learning_rate * grad_b[class] / n;
            }

            if epoch % 100 == 0 {
                debug!(epoch, loss = loss / n, "logistic epoch");
            }
        }

        model.validate()?;
        Ok(model)
    }
}
