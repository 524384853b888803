//! Scoring engine
//!
//! Orchestrates the feature builder and the classifier adapter for a single
//! applicant, then derives the risk tier and recommendation from the label.
//!
//! Two entry points with different failure semantics:
//! - [`ScoringEngine::score`] propagates failures as
//!   [`CreditCoreError::ClassificationFailed`]
//! - [`ScoringEngine::score_contained`] never fails; a failure becomes a
//!   [`BatchEntry::Failed`] so sibling records in a batch are unaffected

use crate::classifier::{ClassifierAdapter, ProbabilisticClassifier};
use crate::errors::{CreditCoreError, Result};
use crate::features::FeatureBuilder;
use crate::monitoring::InferenceMetrics;
use crate::record::ApplicantRecord;
use crate::registry::{ArtifactBundle, EncoderRegistry};
use crate::schema::FEATURE_COUNT;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Label reported for a record that could not be scored
pub const ERROR_LABEL: &str = "Error";

const FALLBACK_RECOMMENDATION: &str = "Unrecognized score; manual review required";

/// Credit labels the classifier is trained to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditLabel {
    Good,
    Standard,
    Poor,
}

impl CreditLabel {
    pub const ALL: [CreditLabel; 3] = [Self::Good, Self::Standard, Self::Poor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Standard => "Standard",
            Self::Poor => "Poor",
        }
    }

    pub fn risk_tier(&self) -> RiskTier {
        match self {
            Self::Good => RiskTier::Low,
            Self::Standard => RiskTier::Medium,
            Self::Poor => RiskTier::High,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Good => "Eligible for credit on favourable terms",
            Self::Standard => "Eligible for credit on standard terms",
            Self::Poor => "Further analysis recommended before approving credit",
        }
    }
}

impl fmt::Display for CreditLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CreditLabel {
    type Err = CreditCoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| CreditCoreError::InvalidInput(format!("unknown credit label '{}'", s)))
    }
}

/// Coarse risk bucket derived from the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Unknown,
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Risk tier for any label string; unrecognized labels map to `Unknown`
pub fn risk_tier(label: &str) -> RiskTier {
    label
        .parse::<CreditLabel>()
        .map(|l| l.risk_tier())
        .unwrap_or(RiskTier::Unknown)
}

/// Recommendation text for any label string
pub fn recommendation(label: &str) -> &'static str {
    label
        .parse::<CreditLabel>()
        .map(|l| l.recommendation())
        .unwrap_or(FALLBACK_RECOMMENDATION)
}

fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &hex[..8])
}

/// Successful classification of one applicant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub label: String,
    pub confidence: f64,
    pub prediction_id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_tier: RiskTier,
    pub recommendation: String,
}

/// Record that could not be scored inside a batch
///
/// Carries the same presentation fields as a [`ScoreResult`] so consumers
/// of serialized batches see label `Error`, zero confidence and tier
/// `Unknown` without matching on the status tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFailure {
    pub label: String,
    pub confidence: f64,
    pub prediction_id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_tier: RiskTier,
    pub recommendation: String,
    pub reason: String,
}

impl ScoreFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            label: ERROR_LABEL.to_string(),
            confidence: 0.0,
            prediction_id: short_id("error"),
            timestamp: Utc::now(),
            risk_tier: RiskTier::Unknown,
            recommendation: format!("Processing failed: {}", reason),
            reason,
        }
    }
}

/// Per-record outcome of batch scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    Scored(ScoreResult),
    Failed(ScoreFailure),
}

impl BatchEntry {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Scored(r) => &r.label,
            Self::Failed(_) => ERROR_LABEL,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Scored(r) => r.confidence,
            Self::Failed(_) => 0.0,
        }
    }

    pub fn risk_tier(&self) -> RiskTier {
        match self {
            Self::Scored(r) => r.risk_tier,
            Self::Failed(_) => RiskTier::Unknown,
        }
    }

    pub fn prediction_id(&self) -> &str {
        match self {
            Self::Scored(r) => &r.prediction_id,
            Self::Failed(f) => &f.prediction_id,
        }
    }

    pub fn as_scored(&self) -> Option<&ScoreResult> {
        match self {
            Self::Scored(r) => Some(r),
            Self::Failed(_) => None,
        }
    }
}

/// Flat record handed to presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub credit_score: String,
    pub confidence: f64,
    pub prediction_id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskTier,
    pub recommendation: String,
}

impl From<&ScoreResult> for ScoreRecord {
    fn from(r: &ScoreResult) -> Self {
        Self {
            credit_score: r.label.clone(),
            confidence: r.confidence,
            prediction_id: r.prediction_id.clone(),
            timestamp: r.timestamp,
            risk_level: r.risk_tier,
            recommendation: r.recommendation.clone(),
        }
    }
}

impl From<&BatchEntry> for ScoreRecord {
    fn from(entry: &BatchEntry) -> Self {
        match entry {
            BatchEntry::Scored(r) => r.into(),
            BatchEntry::Failed(f) => Self {
                credit_score: f.label.clone(),
                confidence: f.confidence,
                prediction_id: f.prediction_id.clone(),
                timestamp: f.timestamp,
                risk_level: f.risk_tier,
                recommendation: f.recommendation.clone(),
            },
        }
    }
}

/// Scores applicants against a loaded registry and classifier
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    builder: FeatureBuilder,
    classifier: ClassifierAdapter,
    metrics: Arc<InferenceMetrics>,
}

impl ScoringEngine {
    /// Wire the engine, refusing a classifier whose shape disagrees with the registry
    pub fn new(
        registry: Arc<EncoderRegistry>,
        classifier: Arc<dyn ProbabilisticClassifier>,
        metrics: Arc<InferenceMetrics>,
    ) -> Result<Self> {
        if classifier.n_features() != FEATURE_COUNT {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "classifier expects {} features, builder produces {}",
                classifier.n_features(),
                FEATURE_COUNT
            )));
        }
        if classifier.n_classes() != registry.target.n_classes() {
            return Err(CreditCoreError::SchemaMismatch(format!(
                "classifier has {} classes, target decoder has {}",
                classifier.n_classes(),
                registry.target.n_classes()
            )));
        }
        Ok(Self {
            builder: FeatureBuilder::new(registry)?,
            classifier: ClassifierAdapter::new(classifier),
            metrics,
        })
    }

    pub fn from_bundle(bundle: &ArtifactBundle, metrics: Arc<InferenceMetrics>) -> Result<Self> {
        let classifier: Arc<dyn ProbabilisticClassifier> = bundle.classifier.clone();
        Self::new(bundle.registry.clone(), classifier, metrics)
    }

    pub fn metrics(&self) -> &InferenceMetrics {
        &self.metrics
    }

    /// Score one applicant, propagating any failure
    pub fn score(&self, record: &ApplicantRecord) -> Result<ScoreResult> {
        match self.classify(record) {
            Ok(result) => {
                self.metrics.record_scored();
                Ok(result)
            }
            Err(err) => {
                self.metrics.record_failed();
                Err(err)
            }
        }
    }

    /// Score one applicant, converting any failure into a [`BatchEntry::Failed`]
    pub fn score_contained(&self, record: &ApplicantRecord) -> BatchEntry {
        match self.score(record) {
            Ok(result) => BatchEntry::Scored(result),
            Err(err) => {
                warn!(error = %err, "record failed to score");
                BatchEntry::Failed(ScoreFailure::new(err.to_string()))
            }
        }
    }

    fn classify(&self, record: &ApplicantRecord) -> Result<ScoreResult> {
        let built = self
            .builder
            .build_with_report(record)
            .map_err(as_classification_failure)?;
        self.metrics.record_fallbacks(&built.fallbacks);

        let prediction = self.classifier.predict(&built.vector)?;
        let label = self
            .builder
            .registry()
            .target
            .decode(prediction.label_code)
            .ok_or_else(|| {
                CreditCoreError::ClassificationFailed(format!(
                    "class index {} has no label",
                    prediction.label_code
                ))
            })?
            .to_string();

        debug!(label = %label, confidence = prediction.confidence, "scored applicant");

        Ok(ScoreResult {
            risk_tier: risk_tier(&label),
            recommendation: recommendation(&label).to_string(),
            label,
            confidence: prediction.confidence,
            prediction_id: short_id("pred"),
            timestamp: Utc::now(),
        })
    }
}

// Configuration errors keep their identity; anything else is a per-record failure.
fn as_classification_failure(err: CreditCoreError) -> CreditCoreError {
    match err {
        CreditCoreError::ClassificationFailed(_) => err,
        e if e.is_configuration_error() => e,
        other => CreditCoreError::ClassificationFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_tier_is_total() {
        assert_eq!(risk_tier("Good"), RiskTier::Low);
        assert_eq!(risk_tier("Standard"), RiskTier::Medium);
        assert_eq!(risk_tier("Poor"), RiskTier::High);
        assert_eq!(risk_tier("Error"), RiskTier::Unknown);
        assert_eq!(risk_tier(""), RiskTier::Unknown);
        assert_eq!(risk_tier("good"), RiskTier::Unknown);
    }

    #[test]
    fn recommendation_has_generic_fallback() {
        assert_eq!(recommendation("Good"), CreditLabel::Good.recommendation());
        assert_eq!(recommendation("Excellent"), FALLBACK_RECOMMENDATION);
    }

    #[test]
    fn labels_round_trip_through_strings() {
        for label in CreditLabel::ALL {
            assert_eq!(label.as_str().parse::<CreditLabel>().unwrap(), label);
            assert_eq!(label.to_string(), label.as_str());
        }
        assert!("Error".parse::<CreditLabel>().is_err());
    }

    #[test]
    fn identifiers_have_prefix_and_eight_hex_chars() {
        let id = short_id("pred");
        assert!(id.starts_with("pred_"));
        assert_eq!(id.len(), 13);
        assert!(id[5..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(short_id("pred"), short_id("pred"));
    }

    #[test]
    fn failed_entry_presents_as_error_record() {
        let entry = BatchEntry::Failed(ScoreFailure::new("bad column"));
        assert!(entry.is_failure());
        assert_eq!(entry.label(), ERROR_LABEL);
        assert_eq!(entry.confidence(), 0.0);
        assert_eq!(entry.risk_tier(), RiskTier::Unknown);
        assert!(entry.prediction_id().starts_with("error_"));

        let record = ScoreRecord::from(&entry);
        assert_eq!(record.credit_score, "Error");
        assert!(record.recommendation.contains("bad column"));
    }

    #[test]
    fn batch_entry_is_tagged_by_status() {
        let entry = BatchEntry::Failed(ScoreFailure::new("x"));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "x");
        assert_eq!(json["label"], "Error");
        assert_eq!(json["confidence"], 0.0);
        assert_eq!(json["risk_tier"], "Unknown");
        assert_eq!(json["recommendation"], "Processing failed: x");

        let back: BatchEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn invalid_input_becomes_classification_failure() {
        let err = as_classification_failure(CreditCoreError::InvalidInput("x".into()));
        assert!(matches!(err, CreditCoreError::ClassificationFailed(_)));
        let err = as_classification_failure(CreditCoreError::SchemaMismatch("x".into()));
        assert!(matches!(err, CreditCoreError::SchemaMismatch(_)));
    }
}
