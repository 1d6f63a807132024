//! Churn risk pipeline: profile → features → probability → tier

use crate::config::AppConfig;
use crate::error::Result;
use crate::feature_extractor::{FeatureAssembler, FeatureExtractor, FeatureVector};
use crate::models::inference::InferenceEngine;
use crate::models::loader::{ArtifactLoader, ModelArtifact};
use crate::types::assessment::{RiskAssessment, RiskThresholds};
use crate::types::profile::CustomerProfile;
use std::sync::Arc;
use tracing::{debug, info};

/// Scores customer profiles against one loaded artifact.
///
/// Construction reconciles the artifact schema, so a pipeline that exists can
/// always assemble a complete feature vector.
#[derive(Debug, Clone)]
pub struct RiskPipeline {
    extractor: FeatureExtractor,
    assembler: FeatureAssembler,
    engine: InferenceEngine,
    thresholds: RiskThresholds,
}

impl RiskPipeline {
    pub fn new(artifact: Arc<ModelArtifact>, thresholds: RiskThresholds) -> Result<Self> {
        thresholds.validate()?;
        let assembler = FeatureAssembler::new(artifact.columns(), artifact.defaults())?;

        let defaulted = assembler.defaulted_columns();
        if !defaulted.is_empty() {
            debug!(columns = ?defaulted, "Columns filled from artifact defaults");
        }

        Ok(Self {
            extractor: FeatureExtractor::new(),
            assembler,
            engine: InferenceEngine::new(artifact),
            thresholds,
        })
    }

    /// Load the configured artifact and build the pipeline around it.
    ///
    /// Any failure here means no assessment can be served.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let artifact = ArtifactLoader::with_threads(config.artifact.onnx_threads)
            .load(&config.artifact.path)?;
        let pipeline = Self::new(Arc::new(artifact), config.risk)?;

        info!(
            inputs = pipeline.extractor.feature_count(),
            input_features = ?pipeline.extractor.feature_names(),
            model_columns = pipeline.assembler.width(),
            defaulted = pipeline.assembler.defaulted_columns().len(),
            "Feature pipeline ready"
        );

        Ok(pipeline)
    }

    pub fn artifact(&self) -> &ModelArtifact {
        self.engine.artifact()
    }

    /// Feature vector the classifier would see for `profile`
    pub fn features(&self, profile: &CustomerProfile) -> FeatureVector {
        self.assembler.assemble(&self.extractor.extract(profile))
    }

    /// Score one customer
    pub fn assess(&self, profile: &CustomerProfile) -> Result<RiskAssessment> {
        let features = self.extractor.extract(profile);
        let vector = self.assembler.assemble(&features);
        let probability = self.engine.predict(&vector)?;

        let assessment =
            RiskAssessment::new(*profile, features.avg_ticket_size, probability, &self.thresholds);

        debug!(
            assessment_id = %assessment.assessment_id,
            probability = probability,
            tier = assessment.tier.as_str(),
            avg_ticket_size = features.avg_ticket_size,
            "Assessment complete"
        );

        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChurnError;
    use crate::models::classifier::{Classifier, LogisticClassifier};
    use crate::types::assessment::RiskTier;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct FixedClassifier(f64);

    impl Classifier for FixedClassifier {
        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn input_width(&self) -> Option<usize> {
            None
        }

        fn predict_proba(&self, _features: &[f64]) -> Result<f64> {
            Ok(self.0)
        }
    }

    fn standard_columns() -> Vec<String> {
        ["Total_Trans_Ct", "Total_Trans_Amt", "Avg_Ticket_Size", "Total_Revolving_Bal"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn fixed_pipeline(p: f64) -> RiskPipeline {
        let artifact = ModelArtifact::new(
            Box::new(FixedClassifier(p)),
            standard_columns(),
            BTreeMap::new(),
            PathBuf::from("memory"),
        )
        .unwrap();
        RiskPipeline::new(Arc::new(artifact), RiskThresholds::default()).unwrap()
    }

    #[test]
    fn test_assembled_vector_for_default_inputs() {
        let pipeline = fixed_pipeline(0.25);
        let vector = pipeline.features(&CustomerProfile::new(60, 4000.0, 1000.0));

        assert_eq!(vector.len(), 4);
        assert_eq!(vector.get("Total_Trans_Ct"), Some(60.0));
        assert_eq!(vector.get("Total_Trans_Amt"), Some(4000.0));
        assert_eq!(format!("{:.2}", vector.get("Avg_Ticket_Size").unwrap()), "66.67");
        assert_eq!(vector.get("Total_Revolving_Bal"), Some(1000.0));
    }

    #[test]
    fn test_zero_transactions_do_not_fault() {
        let pipeline = fixed_pipeline(0.25);
        let assessment = pipeline.assess(&CustomerProfile::new(0, 4000.0, 1000.0)).unwrap();

        assert_eq!(assessment.avg_ticket_size, 0.0);
    }

    #[test]
    fn test_tiers_from_classifier_output() {
        let cases = [
            (0.25, RiskTier::Low, "Maintain current relationship strategy."),
            (0.55, RiskTier::Moderate, "Monitor closely. Consider engagement incentives."),
            (0.85, RiskTier::High, "Urgent retention action required."),
        ];

        for (p, tier, recommendation) in cases {
            let assessment = fixed_pipeline(p).assess(&CustomerProfile::default()).unwrap();
            assert_eq!(assessment.probability, p);
            assert_eq!(assessment.tier, tier);
            assert_eq!(assessment.recommendation, recommendation);
        }
    }

    #[test]
    fn test_unreconcilable_schema_fails_at_construction() {
        let mut columns = standard_columns();
        columns.push("Customer_Age".to_string());
        let artifact = ModelArtifact::new(
            Box::new(FixedClassifier(0.5)),
            columns,
            BTreeMap::new(),
            PathBuf::from("memory"),
        )
        .unwrap();

        let err = RiskPipeline::new(Arc::new(artifact), RiskThresholds::default()).unwrap_err();
        assert!(matches!(err, ChurnError::SchemaMismatch(_)));
        assert!(err.is_artifact_error());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let artifact = ModelArtifact::new(
            Box::new(FixedClassifier(0.5)),
            standard_columns(),
            BTreeMap::new(),
            PathBuf::from("memory"),
        )
        .unwrap();

        let thresholds = RiskThresholds {
            moderate: 0.8,
            high: 0.2,
        };
        assert!(matches!(
            RiskPipeline::new(Arc::new(artifact), thresholds),
            Err(ChurnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_logistic_artifact_end_to_end() {
        let mut defaults = BTreeMap::new();
        defaults.insert("Customer_Age".to_string(), 46.0);
        let mut columns = standard_columns();
        columns.push("Customer_Age".to_string());

        let classifier = LogisticClassifier::new(0.0, vec![-0.05, 0.0, 0.0, 0.0, 0.0], None).unwrap();
        let artifact =
            ModelArtifact::new(Box::new(classifier), columns, defaults, PathBuf::from("memory"))
                .unwrap();
        let pipeline = RiskPipeline::new(Arc::new(artifact), RiskThresholds::default()).unwrap();

        // Few transactions → high churn; many → low churn
        let quiet = pipeline.assess(&CustomerProfile::new(10, 4000.0, 1000.0)).unwrap();
        let busy = pipeline.assess(&CustomerProfile::new(140, 4000.0, 1000.0)).unwrap();
        assert!(quiet.probability > busy.probability);
        assert_eq!(busy.tier, RiskTier::Low);
    }

    #[test]
    fn test_missing_artifact_means_no_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.artifact.path = dir.path().join("churn_model.json");

        let err = RiskPipeline::load(&config).unwrap_err();
        assert!(matches!(err, ChurnError::ArtifactIo { .. }));
        assert!(err.is_artifact_error());
    }

    #[test]
    fn test_malformed_artifact_means_no_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("churn_model.json");
        std::fs::write(&path, r#"{"columns": ["Total_Trans_Ct"]}"#).unwrap();

        let mut config = AppConfig::default();
        config.artifact.path = path;

        let err = RiskPipeline::load(&config).unwrap_err();
        assert!(err.is_artifact_error());
    }

    #[test]
    fn test_load_configured_artifact() {
        let mut config = AppConfig::default();
        config.artifact.path = concat!(env!("CARGO_MANIFEST_DIR"), "/model/churn_model.json").into();

        let pipeline = RiskPipeline::load(&config).unwrap();
        assert_eq!(pipeline.artifact().columns().len(), 7);
        assert!(pipeline.assess(&CustomerProfile::default()).is_ok());
    }

    #[test]
    fn test_bundled_artifact() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/model/churn_model.json");
        let artifact = ArtifactLoader::new().load(path).unwrap();
        let pipeline = RiskPipeline::new(Arc::new(artifact), RiskThresholds::default()).unwrap();

        let vector = pipeline.features(&CustomerProfile::default());
        assert_eq!(vector.len(), 7);
        assert_eq!(vector.columns()[0], "Customer_Age");
        assert_eq!(vector.get("Customer_Age"), Some(46.3));
        assert_eq!(vector.get("Total_Trans_Ct"), Some(60.0));

        let typical = pipeline.assess(&CustomerProfile::default()).unwrap();
        assert!((0.0..=1.0).contains(&typical.probability));

        let disengaged = pipeline.assess(&CustomerProfile::new(10, 500.0, 0.0)).unwrap();
        assert!(disengaged.probability > typical.probability);
    }
}
