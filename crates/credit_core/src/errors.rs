//! Error types for the credit scoring core

use thiserror::Error;

/// Errors that can occur in the credit scoring core
#[derive(Error, Debug)]
pub enum CreditCoreError {
    /// No artifact bundle at the expected location
    #[error("Artifact bundle not found: {location}")]
    ArtifactMissing { location: String },

    /// Bundle exists but cannot be deserialized into the expected shape
    #[error("Artifact bundle is corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Training-time schema disagrees with the feature builder
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Batch exceeds the configured ceiling
    #[error("Batch too large: {size} records (maximum {max})")]
    BatchTooLarge { size: usize, max: usize },

    /// Feature building or classification failed for a single record
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),

    /// Applicant record violates the declared field bounds
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid runtime configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CreditCoreError {
    /// Errors that must stop the process from serving traffic.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ArtifactMissing { .. }
                | Self::ArtifactCorrupt(_)
                | Self::SchemaMismatch(_)
                | Self::Config(_)
        )
    }
}

/// Result type for credit core operations
pub type Result<T> = std::result::Result<T, CreditCoreError>;
