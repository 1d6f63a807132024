//! Error types for the churn risk engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the model artifact or scoring a customer
#[derive(Debug, Error)]
pub enum ChurnError {
    /// The artifact file could not be read
    #[error("failed to read model artifact {}: {source}", path.display())]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact file is not a valid artifact document
    #[error("malformed model artifact {}: {source}", path.display())]
    ArtifactFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The artifact parsed but its contents are unusable
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    /// The classifier referenced by the artifact failed to load
    #[error("failed to load model {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// Declared columns cannot be reconciled with inputs, defaults or the classifier
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The classifier failed while scoring
    #[error("inference failed: {0}")]
    Inference(String),

    /// The classifier returned something that is not a probability
    #[error("classifier returned invalid probability {0}")]
    InvalidProbability(f64),

    /// Configuration values are inconsistent
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChurnError {
    /// Whether the error means the artifact is unusable and predictions must stop
    pub fn is_artifact_error(&self) -> bool {
        matches!(
            self,
            ChurnError::ArtifactIo { .. }
                | ChurnError::ArtifactFormat { .. }
                | ChurnError::InvalidArtifact(_)
                | ChurnError::ModelLoad { .. }
                | ChurnError::SchemaMismatch(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ChurnError>;
