//! Churn risk tiers and assessment results

use crate::error::{ChurnError, Result};
use crate::types::profile::CustomerProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    /// All tiers, lowest first
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Moderate, RiskTier::High];

    /// Determine the tier for a churn probability
    ///
    /// Intervals are closed below and open above: `[0, moderate)`,
    /// `[moderate, high)`, `[high, 1]`.
    pub fn from_probability(probability: f64, thresholds: &RiskThresholds) -> Self {
        if probability >= thresholds.high {
            RiskTier::High
        } else if probability >= thresholds.moderate {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    /// Headline shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW RISK",
            RiskTier::Moderate => "MODERATE RISK",
            RiskTier::High => "HIGH RISK",
        }
    }

    /// Retention action for the tier
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskTier::Low => "Maintain current relationship strategy.",
            RiskTier::Moderate => "Monitor closely. Consider engagement incentives.",
            RiskTier::High => "Urgent retention action required.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Moderate => "moderate",
            RiskTier::High => "high",
        }
    }
}

/// Lower bounds of the moderate and high tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub moderate: f64,
    pub high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.30,
            high: 0.70,
        }
    }
}

impl RiskThresholds {
    /// Thresholds must split [0, 1] into three non-empty intervals
    pub fn validate(&self) -> Result<()> {
        let ordered = 0.0 < self.moderate && self.moderate < self.high && self.high <= 1.0;
        if !ordered {
            return Err(ChurnError::InvalidConfig(format!(
                "risk thresholds must satisfy 0 < moderate < high <= 1 (moderate={}, high={})",
                self.moderate, self.high
            )));
        }
        Ok(())
    }
}

/// Result of scoring one customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unique assessment identifier
    pub assessment_id: String,

    /// Inputs the assessment was computed from
    pub profile: CustomerProfile,

    /// Derived average ticket size
    pub avg_ticket_size: f64,

    /// Probability of churn (0.0 - 1.0)
    pub probability: f64,

    pub tier: RiskTier,

    pub recommendation: String,

    pub assessed_at: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(
        profile: CustomerProfile,
        avg_ticket_size: f64,
        probability: f64,
        thresholds: &RiskThresholds,
    ) -> Self {
        let tier = RiskTier::from_probability(probability, thresholds);
        Self {
            assessment_id: uuid::Uuid::new_v4().to_string(),
            profile,
            avg_ticket_size,
            probability,
            tier,
            recommendation: tier.recommendation().to_string(),
            assessed_at: Utc::now(),
        }
    }
}
