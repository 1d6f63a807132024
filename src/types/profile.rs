//! Customer behavior inputs and the ranges the front end accepts

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

/// Behavioral inputs for a single churn assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Number of transactions in the last year
    #[serde(alias = "Total_Trans_Ct")]
    pub transaction_count: u32,

    /// Total monetary value spent in the last year
    #[serde(alias = "Total_Trans_Amt")]
    pub transaction_amount: f64,

    /// Unpaid balance carried over between billing cycles
    #[serde(alias = "Total_Revolving_Bal")]
    pub revolving_balance: f64,
}

impl CustomerProfile {
    pub fn new(transaction_count: u32, transaction_amount: f64, revolving_balance: f64) -> Self {
        Self {
            transaction_count,
            transaction_amount,
            revolving_balance,
        }
    }
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self::new(60, 4000.0, 1000.0)
    }
}

/// Errors parsing a `count amount balance` line
#[derive(Debug, Error, PartialEq)]
pub enum ProfileParseError {
    #[error("expected 3 values (count amount balance), got {0}")]
    FieldCount(usize),
    #[error("invalid {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

impl FromStr for CustomerProfile {
    type Err = ProfileParseError;

    /// Parse `count amount balance`, separated by whitespace or commas
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 3 {
            return Err(ProfileParseError::FieldCount(parts.len()));
        }

        fn parse<T: FromStr>(field: &'static str, value: &str) -> Result<T, ProfileParseError> {
            value
                .parse()
                .map_err(|_| ProfileParseError::InvalidValue {
                    field,
                    value: value.to_string(),
                })
        }

        Ok(Self {
            transaction_count: parse("transaction count", parts[0])?,
            transaction_amount: parse("transaction amount", parts[1])?,
            revolving_balance: parse("revolving balance", parts[2])?,
        })
    }
}

/// Inclusive numeric bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp into range. Unordered values (NaN) go to `min`.
    pub fn clamp(&self, value: T) -> T {
        match value.partial_cmp(&self.min) {
            Some(Ordering::Less) | None => self.min,
            _ if value > self.max => self.max,
            _ => value,
        }
    }
}

/// Accepted ranges for the three customer inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRanges {
    pub transaction_count: Bounds<u32>,
    pub transaction_amount: Bounds<f64>,
    pub revolving_balance: Bounds<f64>,
}

impl Default for InputRanges {
    fn default() -> Self {
        Self {
            transaction_count: Bounds::new(10, 140),
            transaction_amount: Bounds::new(500.0, 18500.0),
            revolving_balance: Bounds::new(0.0, 2500.0),
        }
    }
}

impl InputRanges {
    /// Names of the bounds whose min exceeds their max
    pub fn invalid_bounds(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if !self.transaction_count.is_valid() {
            invalid.push("transaction_count");
        }
        if !self.transaction_amount.is_valid() {
            invalid.push("transaction_amount");
        }
        if !self.revolving_balance.is_valid() {
            invalid.push("revolving_balance");
        }
        invalid
    }

    /// Names of the profile fields that fall outside the accepted ranges
    pub fn out_of_range(&self, profile: &CustomerProfile) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if !self.transaction_count.contains(profile.transaction_count) {
            fields.push("transaction_count");
        }
        if !self.transaction_amount.contains(profile.transaction_amount) {
            fields.push("transaction_amount");
        }
        if !self.revolving_balance.contains(profile.revolving_balance) {
            fields.push("revolving_balance");
        }
        fields
    }

    /// Clamp every field of the profile into its accepted range
    pub fn clamp(&self, profile: &CustomerProfile) -> CustomerProfile {
        CustomerProfile {
            transaction_count: self.transaction_count.clamp(profile.transaction_count),
            transaction_amount: self.transaction_amount.clamp(profile.transaction_amount),
            revolving_balance: self.revolving_balance.clamp(profile.revolving_balance),
        }
    }
}
