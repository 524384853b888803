//! Inference counters
//!
//! Lock-free counters shared by every scoring call. The unseen-category
//! counters are the monitoring signal for the silent code-0 fallback.

use crate::schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct InferenceMetrics {
    records_scored: AtomicU64,
    records_failed: AtomicU64,
    batches_run: AtomicU64,
    batches_rejected: AtomicU64,
    fallback_total: AtomicU64,
    fallback_by_field: BTreeMap<&'static str, AtomicU64>,
}

/// Point-in-time copy of [`InferenceMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub records_scored: u64,
    pub records_failed: u64,
    pub batches_run: u64,
    pub batches_rejected: u64,
    pub unseen_category_fallbacks: u64,
    pub fallbacks_by_field: BTreeMap<String, u64>,
}

impl InferenceMetrics {
    pub fn new() -> Self {
        Self {
            records_scored: AtomicU64::new(0),
            records_failed: AtomicU64::new(0),
            batches_run: AtomicU64::new(0),
            batches_rejected: AtomicU64::new(0),
            fallback_total: AtomicU64::new(0),
            fallback_by_field: schema::categorical_fields()
                .map(|f| (f.name, AtomicU64::new(0)))
                .collect(),
        }
    }

    pub fn record_scored(&self) {
        self.records_scored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.records_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallbacks(&self, fields: &[&str]) {
        for field in fields {
            self.fallback_total.fetch_add(1, Ordering::Relaxed);
            if let Some(counter) = self.fallback_by_field.get(field) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_scored: self.records_scored.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
            batches_run: self.batches_run.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            unseen_category_fallbacks: self.fallback_total.load(Ordering::Relaxed),
            fallbacks_by_field: self
                .fallback_by_field
                .iter()
                .map(|(k, v)| (k.to_string(), v.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

impl Default for InferenceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
