//! Model artifact loader

use crate::error::{ChurnError, Result};
use crate::models::classifier::{Classifier, LogisticClassifier, StandardScaler};
use crate::models::onnx::OnnxClassifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

/// Classifier section of the artifact document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ModelDefinition {
    /// Logistic regression stored inline
    Logistic {
        intercept: f64,
        coefficients: Vec<f64>,
        #[serde(default)]
        scaler: Option<StandardScaler>,
    },
    /// ONNX model file, relative to the artifact's directory
    Onnx { path: PathBuf },
}

/// On-disk artifact: classifier, ordered columns, per-column defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactDocument {
    pub model: ModelDefinition,
    pub columns: Vec<String>,
    pub defaults: BTreeMap<String, f64>,
}

/// Loaded, immutable model artifact
pub struct ModelArtifact {
    classifier: Box<dyn Classifier>,
    columns: Vec<String>,
    defaults: BTreeMap<String, f64>,
    source: PathBuf,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("classifier", &self.classifier.kind())
            .field("columns", &self.columns)
            .field("defaults", &self.defaults)
            .field("source", &self.source)
            .finish()
    }
}

impl ModelArtifact {
    /// Assemble an artifact from parts, applying the same checks as the loader
    pub fn new(
        classifier: Box<dyn Classifier>,
        columns: Vec<String>,
        defaults: BTreeMap<String, f64>,
        source: PathBuf,
    ) -> Result<Self> {
        validate_schema(&columns, &defaults)?;

        if let Some(width) = classifier.input_width() {
            if width != columns.len() {
                return Err(ChurnError::SchemaMismatch(format!(
                    "{} classifier expects {} features but artifact declares {} columns",
                    classifier.kind(),
                    width,
                    columns.len()
                )));
            }
        }

        Ok(Self {
            classifier,
            columns,
            defaults,
            source,
        })
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn defaults(&self) -> &BTreeMap<String, f64> {
        &self.defaults
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

fn validate_schema(columns: &[String], defaults: &BTreeMap<String, f64>) -> Result<()> {
    if columns.is_empty() {
        return Err(ChurnError::InvalidArtifact(
            "column list is empty".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for column in columns {
        if column.trim().is_empty() {
            return Err(ChurnError::InvalidArtifact(
                "column names must not be blank".to_string(),
            ));
        }
        if !seen.insert(column.as_str()) {
            return Err(ChurnError::InvalidArtifact(format!(
                "duplicate column '{}'",
                column
            )));
        }
    }

    if let Some((name, _)) = defaults.iter().find(|(_, v)| !v.is_finite()) {
        return Err(ChurnError::InvalidArtifact(format!(
            "default for '{}' is not a finite number",
            name
        )));
    }

    Ok(())
}

/// Loader for model artifacts
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a loader with the given ONNX thread count
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Read and validate the artifact at `path`
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<ModelArtifact> {
        let path = path.as_ref();

        info!(path = %path.display(), "Loading model artifact");

        let bytes = std::fs::read(path).map_err(|source| ChurnError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;

        let document: ArtifactDocument =
            serde_json::from_slice(&bytes).map_err(|source| ChurnError::ArtifactFormat {
                path: path.to_path_buf(),
                source,
            })?;

        let artifact = self.build(document, path)?;

        info!(
            path = %path.display(),
            model = artifact.classifier().kind(),
            columns = artifact.columns().len(),
            defaults = artifact.defaults().len(),
            "Model artifact loaded"
        );

        Ok(artifact)
    }

    /// Build an artifact from a parsed document located at `source`
    pub fn build(&self, document: ArtifactDocument, source: &Path) -> Result<ModelArtifact> {
        let classifier: Box<dyn Classifier> = match document.model {
            ModelDefinition::Logistic {
                intercept,
                coefficients,
                scaler,
            } => Box::new(LogisticClassifier::new(intercept, coefficients, scaler)?),
            ModelDefinition::Onnx { path } => {
                let model_path = resolve_relative(source, &path);
                Box::new(OnnxClassifier::load(model_path, self.onnx_threads)?)
            }
        };

        ModelArtifact::new(
            classifier,
            document.columns,
            document.defaults,
            source.to_path_buf(),
        )
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `path` against the directory holding the artifact
fn resolve_relative(artifact: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    artifact
        .parent()
        .map(|dir| dir.join(path))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_artifact(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const VALID: &str = r#"{
        "model": {"type": "logistic", "intercept": 0.5, "coefficients": [-0.04, 0.0002, 0.001, -0.0008, 0.01]},
        "columns": ["Total_Trans_Ct", "Total_Trans_Amt", "Avg_Ticket_Size", "Total_Revolving_Bal", "Customer_Age"],
        "defaults": {"Customer_Age": 46.0}
    }"#;

    #[test]
    fn test_load_valid_artifact() {
        let file = write_artifact(VALID);
        let artifact = ArtifactLoader::new().load(file.path()).unwrap();

        assert_eq!(artifact.classifier().kind(), "logistic");
        assert_eq!(artifact.columns().len(), 5);
        assert_eq!(artifact.columns()[4], "Customer_Age");
        assert_eq!(artifact.defaults().get("Customer_Age"), Some(&46.0));
        assert_eq!(artifact.source(), file.path());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactLoader::new()
            .load(dir.path().join("churn_model.json"))
            .unwrap_err();

        assert!(matches!(err, ChurnError::ArtifactIo { .. }));
        assert!(err.is_artifact_error());
    }

    #[test]
    fn test_corrupt_file() {
        let file = write_artifact("\u{80}not json");
        assert!(matches!(
            ArtifactLoader::new().load(file.path()),
            Err(ChurnError::ArtifactFormat { .. })
        ));
    }

    #[test]
    fn test_missing_defaults_section() {
        let file = write_artifact(
            r#"{"model": {"type": "logistic", "intercept": 0.0, "coefficients": [1.0]},
                "columns": ["Total_Trans_Ct"]}"#,
        );
        assert!(matches!(
            ArtifactLoader::new().load(file.path()),
            Err(ChurnError::ArtifactFormat { .. })
        ));
    }

    #[test]
    fn test_width_mismatch() {
        let file = write_artifact(
            r#"{"model": {"type": "logistic", "intercept": 0.0, "coefficients": [1.0, 2.0]},
                "columns": ["Total_Trans_Ct"], "defaults": {}}"#,
        );
        assert!(matches!(
            ArtifactLoader::new().load(file.path()),
            Err(ChurnError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_duplicate_and_empty_columns() {
        let duplicate = write_artifact(
            r#"{"model": {"type": "logistic", "intercept": 0.0, "coefficients": [1.0, 1.0]},
                "columns": ["Total_Trans_Ct", "Total_Trans_Ct"], "defaults": {}}"#,
        );
        assert!(matches!(
            ArtifactLoader::new().load(duplicate.path()),
            Err(ChurnError::InvalidArtifact(_))
        ));

        let empty = write_artifact(
            r#"{"model": {"type": "logistic", "intercept": 0.0, "coefficients": [1.0]},
                "columns": [], "defaults": {}}"#,
        );
        assert!(ArtifactLoader::new().load(empty.path()).is_err());
    }

    #[test]
    fn test_onnx_path_resolved_next_to_artifact() {
        let resolved = resolve_relative(Path::new("model/churn_model.json"), Path::new("churn.onnx"));
        assert_eq!(resolved, PathBuf::from("model/churn.onnx"));

        let absolute = resolve_relative(Path::new("model/churn_model.json"), Path::new("/opt/m.onnx"));
        assert_eq!(absolute, PathBuf::from("/opt/m.onnx"));
    }

    #[test]
    fn test_missing_onnx_model() {
        let file = write_artifact(
            r#"{"model": {"type": "onnx", "path": "missing.onnx"},
                "columns": ["Total_Trans_Ct"], "defaults": {}}"#,
        );
        assert!(matches!(
            ArtifactLoader::new().load(file.path()),
            Err(ChurnError::ModelLoad { .. })
        ));
    }
}
