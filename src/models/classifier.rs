//! Classifier abstraction and the built-in logistic regression backend

use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};

/// A trained binary classifier scoring one feature row at a time
pub trait Classifier: Send + Sync {
    /// Short backend name for logs and `inspect`
    fn kind(&self) -> &'static str;

    /// Number of features the classifier was trained on, when it declares one
    fn input_width(&self) -> Option<usize>;

    /// Probability of the positive (churn) class for one feature row
    fn predict_proba(&self, features: &[f64]) -> Result<f64>;
}

/// Per-feature standardization applied before the linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Logistic regression: σ(b + Σ wᵢ·(xᵢ − μᵢ)/sᵢ)
#[derive(Debug, Clone)]
pub struct LogisticClassifier {
    intercept: f64,
    coefficients: Vec<f64>,
    scaler: Option<StandardScaler>,
}

impl LogisticClassifier {
    pub fn new(
        intercept: f64,
        coefficients: Vec<f64>,
        scaler: Option<StandardScaler>,
    ) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(ChurnError::InvalidArtifact(
                "logistic model has no coefficients".to_string(),
            ));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ChurnError::InvalidArtifact(
                "logistic model parameters must be finite".to_string(),
            ));
        }

        if let Some(scaler) = &scaler {
            if scaler.mean.len() != coefficients.len() || scaler.scale.len() != coefficients.len() {
                return Err(ChurnError::InvalidArtifact(format!(
                    "scaler has {} means and {} scales for {} coefficients",
                    scaler.mean.len(),
                    scaler.scale.len(),
                    coefficients.len()
                )));
            }
            if scaler.mean.iter().any(|m| !m.is_finite())
                || scaler.scale.iter().any(|s| !s.is_finite() || *s == 0.0)
            {
                return Err(ChurnError::InvalidArtifact(
                    "scaler means must be finite and scales finite and non-zero".to_string(),
                ));
            }
        }

        Ok(Self {
            intercept,
            coefficients,
            scaler,
        })
    }

    /// Linear score before the sigmoid
    pub fn decision_function(&self, features: &[f64]) -> f64 {
        let dot: f64 = match &self.scaler {
            Some(scaler) => features
                .iter()
                .zip(&self.coefficients)
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
                .sum(),
            None => features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| w * x)
                .sum(),
        };
        self.intercept + dot
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticClassifier {
    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn input_width(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(ChurnError::Inference(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }
        Ok(sigmoid(self.decision_function(features)))
    }
}
