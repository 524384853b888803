//! Credit scoring trainer - offline producer of artifact bundles
//!
//! Cleans the raw CSV dataset, fits encoders and the scaler through the
//! same feature schema used at serving time, trains a deterministic random
//! forest or multinomial logistic model and evaluates it on a stratified
//! held-out split.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod preprocess;
pub mod trainer;

use chrono::Utc;
use std::path::{Path, PathBuf};

pub use dataset::{Dataset, TrainingRow, MISSING_CATEGORY};
pub use deterministic::{stratified_split, LcgRng};
pub use errors::{Result, TrainerError};
pub use forest::{ForestConfig, RandomForestTrainer};
pub use logistic::{LogisticConfig, LogisticTrainer};
pub use preprocess::{prepare, PreparedData};
pub use trainer::{ModelKind, TrainedBundle, Trainer, TrainingParams};

/// Train a model directly from a CSV file using the provided parameters.
pub fn train_model_from_csv(path: &Path, params: TrainingParams) -> Result<TrainedBundle> {
    let dataset = Dataset::from_csv(path)?;
    Trainer::new(params).train(&dataset)
}

/// Write a trained bundle under `models_dir`, stamped with the current time
pub fn write_bundle(models_dir: &Path, trained: &TrainedBundle) -> Result<PathBuf> {
    let path = credit_core::save_bundle(
        models_dir,
        trained.model.kind(),
        Utc::now(),
        &trained.registry,
        &trained.model,
        trained.metrics.as_ref(),
    )?;
    Ok(path)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
