//! Credit risk inference core
//!
//! Turns validated applicant records into credit labels using a trained
//! artifact bundle (classifier + encoders) produced by `credit-trainer`.
//!
//! Modules:
//! - `schema`: Frozen feature order shared by training and serving
//! - `record`: Applicant record and its bounds
//! - `encoders`: Categorical encoders, standard scaler, target decoder
//! - `features`: Record → scaled feature vector
//! - `classifier`: Random forest / logistic models behind a shape-checking adapter
//! - `registry`: Artifact bundle layout, loading and writing
//! - `scoring`: Single-record scoring, risk tier and recommendation
//! - `batch`: Bounded, order-preserving batch scoring
//! - `monitoring`: Inference counters
//! - `health`: Model handle and health reports
//! - `config`: Runtime configuration
//! - `service`: Process-wide composition of the above

pub mod batch;
pub mod classifier;
pub mod config;
pub mod encoders;
pub mod errors;
pub mod features;
pub mod health;
pub mod monitoring;
pub mod record;
pub mod registry;
pub mod schema;
pub mod scoring;
pub mod service;

pub use batch::{BatchCoordinator, BatchResult, MAX_BATCH_SIZE};
pub use classifier::{
    ClassifierAdapter, ClassifierModel, ForestModel, LogisticModel, Prediction,
    ProbabilisticClassifier,
};
pub use config::CoreConfig;
pub use encoders::{CategoricalEncoder, StandardScaler, TargetDecoder};
pub use errors::{CreditCoreError, Result};
pub use features::{assemble_raw, FeatureBuilder, FeatureVector};
pub use health::{HealthReport, HealthStatus, ModelHandle};
pub use monitoring::{InferenceMetrics, MetricsSnapshot};
pub use record::ApplicantRecord;
pub use registry::{save_bundle, ArtifactBundle, EncoderRegistry, EvaluationMetrics};
pub use schema::{FieldSource, FEATURE_COUNT};
pub use scoring::{
    recommendation, risk_tier, BatchEntry, CreditLabel, RiskTier, ScoreFailure, ScoreRecord,
    ScoreResult, ScoringEngine,
};
pub use service::CreditScoringService;

/// Crate version string for health reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
