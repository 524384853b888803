//! Health and version surface
//!
//! The loaded model is installed exactly once per process; afterwards the
//! handle only answers "is a model loaded" and "which version".

use crate::errors::{CreditCoreError, Result};
use crate::monitoring::{InferenceMetrics, MetricsSnapshot};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Health status of the scoring core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Identity of the artifact bundle in use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub bundle_name: String,
    pub version: String,
    pub kind: String,
    pub fingerprint: String,
}

/// Set-once slot for the loaded model's identity
#[derive(Debug, Default)]
pub struct ModelHandle {
    cell: OnceCell<ModelInfo>,
}

impl ModelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the loaded model; a second install is refused
    pub fn install(&self, info: ModelInfo) -> Result<()> {
        self.cell.set(info).map_err(|rejected| {
            CreditCoreError::Config(format!(
                "model already loaded; refusing to replace with {}",
                rejected.bundle_name
            ))
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn version(&self) -> Option<&str> {
        self.cell.get().map(|info| info.version.as_str())
    }

    pub fn info(&self) -> Option<&ModelInfo> {
        self.cell.get()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub model_version: Option<String>,
    pub bundle_name: Option<String>,
    pub fingerprint: Option<String>,
    pub core_version: String,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
}

/// Builds health reports from the model handle and inference counters
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    started: Instant,
    handle: Arc<ModelHandle>,
    metrics: Arc<InferenceMetrics>,
}

impl HealthMonitor {
    pub fn new(handle: Arc<ModelHandle>, metrics: Arc<InferenceMetrics>) -> Self {
        Self {
            started: Instant::now(),
            handle,
            metrics,
        }
    }

    pub fn report(&self) -> HealthReport {
        let info = self.handle.info();
        HealthReport {
            status: if info.is_some() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            model_loaded: info.is_some(),
            model_version: info.map(|i| i.version.clone()),
            bundle_name: info.map(|i| i.bundle_name.clone()),
            fingerprint: info.map(|i| i.fingerprint.clone()),
            core_version: crate::VERSION.to_string(),
            uptime_seconds: self.started.elapsed().as_secs(),
            timestamp: Utc::now(),
            metrics: self.metrics.snapshot(),
        }
    }
}
