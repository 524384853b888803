//! Batch coordinator
//!
//! Scores up to [`MAX_BATCH_SIZE`] records sequentially, preserving input
//! order. Oversized batches are rejected before any record is touched.

use crate::errors::{CreditCoreError, Result};
use crate::record::ApplicantRecord;
use crate::scoring::{BatchEntry, ScoreRecord, ScoringEngine};
use serde::{Serialize, Serializer};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Hard ceiling on records per batch
pub const MAX_BATCH_SIZE: usize = 100;

/// Ordered outcomes of one batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub results: Vec<BatchEntry>,
    pub total_processed: usize,
    pub failed: usize,
    #[serde(rename = "processing_time", serialize_with = "as_seconds")]
    pub processing_time: Duration,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.total_processed - self.failed
    }

    /// Flat per-record view in input order
    pub fn records(&self) -> Vec<ScoreRecord> {
        self.results.iter().map(ScoreRecord::from).collect()
    }
}

fn as_seconds<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    engine: ScoringEngine,
    max_size: usize,
}

impl BatchCoordinator {
    pub fn new(engine: ScoringEngine) -> Self {
        Self {
            engine,
            max_size: MAX_BATCH_SIZE,
        }
    }

    /// Lower the ceiling; values above [`MAX_BATCH_SIZE`] are clamped to it
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.min(MAX_BATCH_SIZE);
        self
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    #[instrument(skip_all, fields(size = records.len()))]
    pub fn run(&self, records: &[ApplicantRecord]) -> Result<BatchResult> {
        if records.len() > self.max_size {
            self.engine.metrics().record_batch_rejected();
            warn!(max = self.max_size, "batch rejected");
            return Err(CreditCoreError::BatchTooLarge {
                size: records.len(),
                max: self.max_size,
            });
        }

        let start = Instant::now();
        let results: Vec<BatchEntry> = records
            .iter()
            .map(|record| self.engine.score_contained(record))
            .collect();
        let processing_time = start.elapsed();

        let failed = results.iter().filter(|e| e.is_failure()).count();
        self.engine.metrics().record_batch();
        info!(
            total = results.len(),
            failed,
            elapsed_ms = processing_time.as_millis() as u64,
            "batch scored"
        );

        Ok(BatchResult {
            total_processed: results.len(),
            failed,
            results,
            processing_time,
        })
    }
}
