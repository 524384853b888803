//! Process-wide scoring service
//!
//! Loads one artifact bundle at startup and shares it read-only across all
//! calls. Callers pass an already-authenticated identity, which is only
//! recorded on the tracing span.

use crate::batch::{BatchCoordinator, BatchResult};
use crate::config::CoreConfig;
use crate::errors::Result;
use crate::health::{HealthMonitor, HealthReport, ModelHandle, ModelInfo};
use crate::monitoring::InferenceMetrics;
use crate::record::ApplicantRecord;
use crate::registry::{ArtifactBundle, EvaluationMetrics};
use crate::scoring::{ScoreResult, ScoringEngine};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct CreditScoringService {
    handle: Arc<ModelHandle>,
    monitor: HealthMonitor,
    coordinator: BatchCoordinator,
    evaluation: Option<EvaluationMetrics>,
}

impl CreditScoringService {
    /// Load the newest bundle named by the configuration
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        config.validate()?;
        let bundle = ArtifactBundle::load_latest(
            &config.models.directory,
            config.models.bundle_prefix.as_deref(),
        )?;
        Self::from_bundle(bundle, config.batch.max_size)
    }

    pub fn from_bundle(bundle: ArtifactBundle, max_batch_size: usize) -> Result<Self> {
        let metrics = Arc::new(InferenceMetrics::new());
        let engine = ScoringEngine::from_bundle(&bundle, metrics.clone())?;

        let handle = Arc::new(ModelHandle::new());
        handle.install(ModelInfo {
            bundle_name: bundle.name.clone(),
            version: bundle.version.clone(),
            kind: bundle.classifier.kind().to_string(),
            fingerprint: bundle.fingerprint.clone(),
        })?;

        info!(
            bundle = %bundle.name,
            version = %bundle.version,
            fingerprint = %bundle.fingerprint,
            "scoring service ready"
        );

        Ok(Self {
            monitor: HealthMonitor::new(handle.clone(), metrics),
            handle,
            coordinator: BatchCoordinator::new(engine).with_max_size(max_batch_size),
            evaluation: bundle.metrics,
        })
    }

    #[instrument(skip(self, record))]
    pub fn score(&self, identity: &str, record: &ApplicantRecord) -> Result<ScoreResult> {
        self.coordinator.engine().score(record)
    }

    #[instrument(skip(self, records), fields(size = records.len()))]
    pub fn score_batch(&self, identity: &str, records: &[ApplicantRecord]) -> Result<BatchResult> {
        self.coordinator.run(records)
    }

    pub fn is_model_loaded(&self) -> bool {
        self.handle.is_loaded()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.handle.version()
    }

    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.handle.info()
    }

    /// Held-out metrics recorded by the trainer, if the bundle carries them
    pub fn evaluation(&self) -> Option<&EvaluationMetrics> {
        self.evaluation.as_ref()
    }

    pub fn max_batch_size(&self) -> usize {
        self.coordinator.max_size()
    }

    pub fn health(&self) -> HealthReport {
        self.monitor.report()
    }
}
