//! Type definitions for the churn risk engine

pub mod assessment;
pub mod profile;

pub use assessment::{RiskAssessment, RiskThresholds, RiskTier};
pub use profile::{Bounds, CustomerProfile, InputRanges, ProfileParseError};
