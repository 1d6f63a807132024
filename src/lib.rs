//! Churn Risk Engine Library
//!
//! Scores credit card customers for churn risk from their transaction
//! behavior using a pre-trained classifier artifact.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod types;

pub use config::AppConfig;
pub use error::{ChurnError, Result};
pub use feature_extractor::{FeatureAssembler, FeatureExtractor, FeatureVector};
pub use models::{ArtifactLoader, InferenceEngine, ModelArtifact};
pub use pipeline::RiskPipeline;
pub use types::{assessment::RiskAssessment, profile::CustomerProfile};
