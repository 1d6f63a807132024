//! Feature extraction for churn model inference.
//!
//! Turns a customer profile into the named behavioral features used during
//! training, then lays them out in the exact column order the model artifact
//! declares.

use crate::error::{ChurnError, Result};
use crate::types::profile::CustomerProfile;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Features the extractor can supply, named by their training column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFeature {
    TransactionCount,
    TransactionAmount,
    AvgTicketSize,
    RevolvingBalance,
}

impl InputFeature {
    pub const ALL: [InputFeature; 4] = [
        InputFeature::TransactionCount,
        InputFeature::TransactionAmount,
        InputFeature::AvgTicketSize,
        InputFeature::RevolvingBalance,
    ];

    /// Column name used in the training data
    pub fn column_name(&self) -> &'static str {
        match self {
            InputFeature::TransactionCount => "Total_Trans_Ct",
            InputFeature::TransactionAmount => "Total_Trans_Amt",
            InputFeature::AvgTicketSize => "Avg_Ticket_Size",
            InputFeature::RevolvingBalance => "Total_Revolving_Bal",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

/// Average value per transaction; zero when there are no transactions
pub fn average_ticket_size(transaction_count: u32, transaction_amount: f64) -> f64 {
    if transaction_count > 0 {
        transaction_amount / transaction_count as f64
    } else {
        0.0
    }
}

/// Raw inputs plus the derived average ticket size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineeredFeatures {
    pub total_trans_ct: f64,
    pub total_trans_amt: f64,
    pub avg_ticket_size: f64,
    pub total_revolving_bal: f64,
}

impl EngineeredFeatures {
    pub fn value(&self, feature: InputFeature) -> f64 {
        match feature {
            InputFeature::TransactionCount => self.total_trans_ct,
            InputFeature::TransactionAmount => self.total_trans_amt,
            InputFeature::AvgTicketSize => self.avg_ticket_size,
            InputFeature::RevolvingBalance => self.total_revolving_bal,
        }
    }
}

/// Feature extractor that transforms customer profiles into model features.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the raw and derived features from a profile.
    pub fn extract(&self, profile: &CustomerProfile) -> EngineeredFeatures {
        EngineeredFeatures {
            total_trans_ct: profile.transaction_count as f64,
            total_trans_amt: profile.transaction_amount,
            avg_ticket_size: average_ticket_size(
                profile.transaction_count,
                profile.transaction_amount,
            ),
            total_revolving_bal: profile.revolving_balance,
        }
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        InputFeature::ALL.len()
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> Vec<&'static str> {
        InputFeature::ALL.iter().map(|f| f.column_name()).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Feature values laid out in the artifact's declared column order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column by name
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    /// (column, value) pairs in declared order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Where a declared column gets its value from
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnSource {
    Input(InputFeature),
    Default(f64),
}

/// Reconciles declared columns with extracted features and artifact defaults.
///
/// The column-to-source mapping is resolved once at construction; after that
/// every assembled vector has exactly the declared columns in declared order.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    columns: Arc<[String]>,
    sources: Vec<ColumnSource>,
}

impl FeatureAssembler {
    /// Build the column mapping.
    ///
    /// Fails when the column list is empty, repeats a name, or declares a
    /// column that is neither an extracted feature nor covered by a default.
    pub fn new(columns: &[String], defaults: &BTreeMap<String, f64>) -> Result<Self> {
        if columns.is_empty() {
            return Err(ChurnError::SchemaMismatch(
                "artifact declares no columns".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        let mut sources = Vec::with_capacity(columns.len());
        let mut unresolved = Vec::new();

        for column in columns {
            if !seen.insert(column.as_str()) {
                return Err(ChurnError::SchemaMismatch(format!(
                    "column '{}' declared more than once",
                    column
                )));
            }

            if let Some(feature) = InputFeature::from_column(column) {
                sources.push(ColumnSource::Input(feature));
            } else if let Some(&default) = defaults.get(column) {
                if !default.is_finite() {
                    return Err(ChurnError::SchemaMismatch(format!(
                        "default for column '{}' is not a finite number",
                        column
                    )));
                }
                sources.push(ColumnSource::Default(default));
            } else {
                unresolved.push(column.as_str());
            }
        }

        if !unresolved.is_empty() {
            return Err(ChurnError::SchemaMismatch(format!(
                "no input or default value for columns: {}",
                unresolved.join(", ")
            )));
        }

        let unused: Vec<&str> = defaults
            .keys()
            .map(String::as_str)
            .filter(|name| !seen.contains(name))
            .collect();
        if !unused.is_empty() {
            debug!(columns = ?unused, "Ignoring defaults for undeclared columns");
        }

        Ok(Self {
            columns: columns.to_vec().into(),
            sources,
        })
    }

    /// Number of columns in every assembled vector
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns filled from artifact defaults rather than customer inputs
    pub fn defaulted_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .zip(&self.sources)
            .filter(|(_, source)| matches!(source, ColumnSource::Default(_)))
            .map(|(column, _)| column.as_str())
            .collect()
    }

    /// Lay the features out in declared column order
    pub fn assemble(&self, features: &EngineeredFeatures) -> FeatureVector {
        let values = self
            .sources
            .iter()
            .map(|source| match *source {
                ColumnSource::Input(feature) => features.value(feature),
                ColumnSource::Default(value) => value,
            })
            .collect();

        FeatureVector {
            columns: Arc::clone(&self.columns),
            values,
        }
    }
}
