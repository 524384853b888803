//! Training orchestration
//!
//! Dataset → fitted encoders and scaled matrix → stratified split →
//! classifier of the requested kind → held-out evaluation.

use credit_core::{
    ClassifierAdapter, ClassifierModel, EncoderRegistry, EvaluationMetrics, FeatureVector,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::dataset::Dataset;
use crate::deterministic::stratified_split;
use crate::errors::{Result, TrainerError};
use crate::forest::{ForestConfig, RandomForestTrainer};
use crate::logistic::{LogisticConfig, LogisticTrainer};
use crate::metrics::evaluate;
use crate::preprocess::prepare;

/// Classifier family to train
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelKind {
    RandomForest,
    Logistic,
}

impl ModelKind {
    /// Bundle prefix for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RandomForest => "random_forest",
            Self::Logistic => "logistic",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "random-forest" | "random_forest" | "forest" => Ok(Self::RandomForest),
            "logistic" | "logistic-regression" => Ok(Self::Logistic),
            other => Err(format!(
                "unknown model kind '{}' (expected random-forest or logistic)",
                other
            )),
        }
    }
}

/// Everything the trainer needs besides the data
#[derive(Clone, Debug)]
pub struct TrainingParams {
    pub kind: ModelKind,
    pub test_size: f64,
    pub split_seed: i64,
    pub forest: ForestConfig,
    pub logistic: LogisticConfig,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            kind: ModelKind::RandomForest,
            test_size: 0.2,
            split_seed: 42,
            forest: ForestConfig::default(),
            logistic: LogisticConfig::default(),
        }
    }
}

/// Output of a training run, ready to be written as a bundle
#[derive(Clone, Debug)]
pub struct TrainedBundle {
    pub registry: EncoderRegistry,
    pub model: ClassifierModel,
    /// `None` when the split left no held-out rows
    pub metrics: Option<EvaluationMetrics>,
    pub train_rows: usize,
    pub test_rows: usize,
}

pub struct Trainer {
    params: TrainingParams,
}

impl Trainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    #[instrument(skip_all, fields(kind = %self.params.kind, rows = dataset.len()))]
    pub fn train(&self, dataset: &Dataset) -> Result<TrainedBundle> {
        if !(0.0..1.0).contains(&self.params.test_size) {
            return Err(TrainerError::Training(format!(
                "test size must be in [0, 1), got {}",
                self.params.test_size
            )));
        }

        let prepared = prepare(dataset)?;
        let n_classes = prepared.n_classes();
        let (train_idx, test_idx) =
            stratified_split(&prepared.targets, self.params.test_size, self.params.split_seed);
        info!(train = train_idx.len(), test = test_idx.len(), "stratified split");

        let select = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
            idx.iter()
                .map(|&i| (prepared.features[i].clone(), prepared.targets[i]))
                .unzip()
        };
        let (x_train, y_train) = select(&train_idx);
        let (x_test, y_test) = select(&test_idx);

        let model = match self.params.kind {
            ModelKind::RandomForest => ClassifierModel::RandomForest(
                RandomForestTrainer::new(self.params.forest.clone())
                    .train(&x_train, &y_train, n_classes)?,
            ),
            ModelKind::Logistic => ClassifierModel::Logistic(
                LogisticTrainer::new(self.params.logistic.clone())
                    .train(&x_train, &y_train, n_classes)?,
            ),
        };

        let metrics = if x_test.is_empty() {
            None
        } else {
            let adapter = ClassifierAdapter::new(Arc::new(model.clone()));
            let predicted = x_test
                .into_iter()
                .map(|row| adapter.predict_class(&FeatureVector::from(row)))
                .collect::<credit_core::Result<Vec<_>>>()?;
            let metrics = evaluate(&y_test, &predicted, n_classes);
            info!(
                accuracy = metrics.accuracy,
                precision = metrics.precision,
                recall = metrics.recall,
                f1 = metrics.f1_score,
                "held-out evaluation"
            );
            Some(metrics)
        };

        Ok(TrainedBundle {
            registry: prepared.registry,
            model,
            metrics,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
        })
    }
}
