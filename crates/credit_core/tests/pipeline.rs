//! End-to-end scoring against an on-disk artifact bundle

mod common;

use chrono::{TimeZone, Utc};
use common::{forest, registry, write_bundle};
use credit_core::classifier::{ClassTree, Node};
use credit_core::record::sample_applicant;
use credit_core::schema::{FEATURE_COUNT, OCCUPATION, PAYMENT_BEHAVIOUR};
use credit_core::{
    save_bundle, ApplicantRecord, ArtifactBundle, BatchCoordinator, BatchEntry, ClassifierModel,
    CoreConfig, CreditCoreError, CreditScoringService, ForestModel, HealthStatus,
    InferenceMetrics, ProbabilisticClassifier, RiskTier, ScoringEngine, MAX_BATCH_SIZE,
};
use std::sync::Arc;
use tempfile::tempdir;

fn service() -> (tempfile::TempDir, CreditScoringService) {
    let dir = tempdir().unwrap();
    write_bundle(dir.path());
    let mut config = CoreConfig::default();
    config.models.directory = dir.path().to_path_buf();
    let service = CreditScoringService::from_config(&config).unwrap();
    (dir, service)
}

fn late_payer() -> ApplicantRecord {
    let mut record = sample_applicant();
    record.num_of_delayed_payment = 15;
    record
}

#[test]
fn scores_sample_applicant_end_to_end() {
    let (_dir, service) = service();
    let result = service.score("analyst", &sample_applicant()).unwrap();

    assert_eq!(result.label, "Good");
    assert_eq!(result.risk_tier, RiskTier::Low);
    assert!((0.0..=1.0).contains(&result.confidence));
    assert!((result.confidence - 0.7).abs() < 1e-12);
    assert!(result.prediction_id.starts_with("pred_"));
}

#[test]
fn risk_tier_tracks_label() {
    let (_dir, service) = service();
    let poor = service.score("analyst", &late_payer()).unwrap();
    assert_eq!(poor.label, "Poor");
    assert_eq!(poor.risk_tier, RiskTier::High);

    let mut indebted = sample_applicant();
    indebted.outstanding_debt = 100_000.0;
    indebted.annual_income = 50_000.0;
    let standard = service.score("analyst", &indebted).unwrap();
    assert_eq!(standard.label, "Standard");
    assert_eq!(standard.risk_tier, RiskTier::Medium);
}

#[test]
fn prediction_ids_are_unique_per_call() {
    let (_dir, service) = service();
    let a = service.score("analyst", &sample_applicant()).unwrap();
    let b = service.score("analyst", &sample_applicant()).unwrap();
    assert_eq!(a.label, b.label);
    assert_eq!(a.confidence, b.confidence);
    assert_ne!(a.prediction_id, b.prediction_id);
}

#[test]
fn version_comes_from_bundle_name() {
    let (_dir, service) = service();
    assert!(service.is_model_loaded());
    assert_eq!(service.model_version(), Some("20240115_093000"));
    assert_eq!(service.evaluation().map(|m| m.accuracy), Some(0.81));

    let health = service.health();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.bundle_name.as_deref(), Some("random_forest_20240115_093000"));
    assert_eq!(health.fingerprint.as_ref().map(String::len), Some(64));
}

#[test]
fn fingerprint_is_stable_across_loads() {
    let dir = tempdir().unwrap();
    let path = write_bundle(dir.path());
    let first = ArtifactBundle::load(&path).unwrap();
    let second = ArtifactBundle::load(&path).unwrap();
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn unseen_categories_fall_back_without_failing() {
    let (_dir, service) = service();
    let mut astronaut = sample_applicant();
    astronaut.occupation = "Astronaut".into();
    astronaut.payment_behaviour = "Erratic".into();

    let records = vec![sample_applicant(), astronaut, late_payer()];
    let batch = service.score_batch("analyst", &records).unwrap();

    assert_eq!(batch.total_processed, 3);
    assert_eq!(batch.failed, 0);
    assert!(batch.results.iter().all(|e| !e.is_failure()));

    let snapshot = service.health().metrics;
    assert_eq!(snapshot.unseen_category_fallbacks, 2);
    assert_eq!(snapshot.fallbacks_by_field[OCCUPATION], 1);
    assert_eq!(snapshot.fallbacks_by_field[PAYMENT_BEHAVIOUR], 1);
}

#[test]
fn batch_preserves_input_order() {
    let (_dir, service) = service();
    let records = vec![late_payer(), sample_applicant(), late_payer()];
    let batch = service.score_batch("analyst", &records).unwrap();
    let labels: Vec<&str> = batch.results.iter().map(BatchEntry::label).collect();
    assert_eq!(labels, vec!["Poor", "Good", "Poor"]);
}

#[test]
fn batch_at_ceiling_is_accepted() {
    let (_dir, service) = service();
    let records = vec![sample_applicant(); MAX_BATCH_SIZE];
    let batch = service.score_batch("analyst", &records).unwrap();
    assert_eq!(batch.total_processed, MAX_BATCH_SIZE);
    assert_eq!(batch.results.len(), MAX_BATCH_SIZE);
}

#[test]
fn oversized_batch_is_rejected_before_any_work() {
    let (_dir, service) = service();
    let records = vec![sample_applicant(); MAX_BATCH_SIZE + 1];
    let err = service.score_batch("analyst", &records).unwrap_err();
    assert!(matches!(
        err,
        CreditCoreError::BatchTooLarge { size: 101, max: 100 }
    ));

    let snapshot = service.health().metrics;
    assert_eq!(snapshot.records_scored, 0);
    assert_eq!(snapshot.batches_rejected, 1);
}

#[test]
fn empty_batch_is_valid() {
    let (_dir, service) = service();
    let batch = service.score_batch("analyst", &[]).unwrap();
    assert_eq!(batch.total_processed, 0);
    assert!(batch.results.is_empty());
}

#[test]
fn bad_record_is_isolated_in_batch() {
    let (_dir, service) = service();
    let mut broken = sample_applicant();
    broken.annual_income = f64::NAN;

    let records = vec![sample_applicant(), broken.clone(), late_payer()];
    let batch = service.score_batch("analyst", &records).unwrap();

    assert_eq!(batch.total_processed, 3);
    assert_eq!(batch.failed, 1);
    assert_eq!(batch.results[0].label(), "Good");
    assert_eq!(batch.results[2].label(), "Poor");
    match &batch.results[1] {
        BatchEntry::Failed(failure) => assert!(failure.prediction_id.starts_with("error_")),
        other => panic!("expected failure, got {:?}", other),
    }

    let err = service.score("analyst", &broken).unwrap_err();
    assert!(matches!(err, CreditCoreError::ClassificationFailed(_)));
}

#[derive(Debug)]
struct Broken;

impl ProbabilisticClassifier for Broken {
    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }
    fn n_classes(&self) -> usize {
        3
    }
    fn predict_proba(&self, _features: &[f64]) -> credit_core::Result<Vec<f64>> {
        Err(CreditCoreError::ClassificationFailed("model exploded".into()))
    }
}

#[test]
fn batch_where_every_record_fails_still_reports() {
    let engine = ScoringEngine::new(
        Arc::new(registry()),
        Arc::new(Broken),
        Arc::new(InferenceMetrics::new()),
    )
    .unwrap();
    let coordinator = BatchCoordinator::new(engine);

    let records = vec![sample_applicant(); 3];
    let batch = coordinator.run(&records).unwrap();
    assert_eq!(batch.total_processed, 3);
    assert_eq!(batch.failed, 3);
    assert_eq!(batch.succeeded(), 0);
    for entry in &batch.results {
        assert_eq!(entry.label(), "Error");
        assert_eq!(entry.confidence(), 0.0);
        assert_eq!(entry.risk_tier(), RiskTier::Unknown);
    }

    let flat = batch.records();
    assert!(flat[0].recommendation.contains("model exploded"));
    let json = serde_json::to_value(&batch).unwrap();
    assert!(json["processing_time"].as_f64().unwrap() >= 0.0);
    for entry in json["results"].as_array().unwrap() {
        assert_eq!(entry["status"], "failed");
        assert_eq!(entry["label"], "Error");
        assert_eq!(entry["confidence"], 0.0);
        assert_eq!(entry["risk_tier"], "Unknown");
        assert!(entry["recommendation"]
            .as_str()
            .unwrap()
            .contains("model exploded"));
    }
}

#[test]
fn missing_bundle_is_a_configuration_error() {
    let dir = tempdir().unwrap();
    let mut config = CoreConfig::default();
    config.models.directory = dir.path().join("absent");
    let err = CreditScoringService::from_config(&config).unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(err, CreditCoreError::ArtifactMissing { .. }));
}

#[test]
fn reordered_encoder_columns_refuse_to_load() {
    let dir = tempdir().unwrap();
    let created = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let mut shuffled = registry();
    shuffled.feature_names.swap(0, 1);
    save_bundle(dir.path(), "random_forest", created, &shuffled, &forest(), None).unwrap();

    let err = ArtifactBundle::load_latest(dir.path(), None).unwrap_err();
    assert!(matches!(err, CreditCoreError::SchemaMismatch(_)));
}

#[test]
fn classifier_with_wrong_width_is_refused() {
    let narrow = ClassifierModel::RandomForest(ForestModel::new(
        FEATURE_COUNT - 1,
        3,
        vec![ClassTree::new(vec![Node::leaf(0, vec![1.0, 0.0, 0.0])])],
    ));
    let err = ScoringEngine::new(
        Arc::new(registry()),
        Arc::new(narrow),
        Arc::new(InferenceMetrics::new()),
    )
    .unwrap_err();
    assert!(matches!(err, CreditCoreError::SchemaMismatch(_)));
}
