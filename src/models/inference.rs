//! Classifier invocation for churn scoring

use crate::error::{ChurnError, Result};
use crate::feature_extractor::FeatureVector;
use crate::models::loader::ModelArtifact;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Runs the artifact's classifier on assembled feature vectors
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    artifact: Arc<ModelArtifact>,
}

impl InferenceEngine {
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Probability of churn for one feature vector.
    ///
    /// The vector must come from a `FeatureAssembler` built on this artifact's
    /// schema; column order is not checked again here.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let start = Instant::now();
        let classifier = self.artifact.classifier();

        let probability = classifier.predict_proba(features.values())?;

        if !(0.0..=1.0).contains(&probability) {
            return Err(ChurnError::InvalidProbability(probability));
        }

        debug!(
            model = classifier.kind(),
            probability = probability,
            inference_us = start.elapsed().as_micros() as u64,
            "Inference complete"
        );

        Ok(probability)
    }
}
