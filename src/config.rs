//! Configuration management for the churn risk engine

use crate::types::assessment::RiskThresholds;
use crate::types::profile::InputRanges;
use anyhow::{bail, Context, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub artifact: ArtifactConfig,
    /// Risk tier thresholds
    pub risk: RiskThresholds,
    /// Accepted ranges for customer inputs
    pub inputs: InputRanges,
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Path to the artifact JSON document
    pub path: PathBuf,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (pretty, json)
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the default path.
    ///
    /// The default file may be absent, in which case the built-in defaults
    /// are used.
    pub fn load() -> Result<Self> {
        Self::load_layered(Path::new(DEFAULT_CONFIG_PATH), false)
    }

    /// Load configuration from a specific path.
    ///
    /// Values in the file override the built-in defaults. The file must exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_layered(path.as_ref(), true)
    }

    fn load_layered(path: &Path, required: bool) -> Result<Self> {
        let config = Config::builder()
            .add_source(
                Config::try_from(&AppConfig::default())
                    .context("Failed to encode default configuration")?,
            )
            .add_source(File::from(path).required(required))
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        self.risk.validate()?;

        let invalid = self.inputs.invalid_bounds();
        if !invalid.is_empty() {
            bail!("input ranges have min > max for: {}", invalid.join(", "));
        }

        if self.artifact.onnx_threads == 0 {
            bail!("artifact.onnx_threads must be at least 1");
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact: ArtifactConfig {
                path: PathBuf::from("model/churn_model.json"),
                onnx_threads: default_onnx_threads(),
            },
            risk: RiskThresholds::default(),
            inputs: InputRanges::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}
