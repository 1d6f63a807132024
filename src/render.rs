//! Text and JSON rendering of assessments

use crate::feature_extractor::FeatureVector;
use crate::models::loader::ModelArtifact;
use crate::types::assessment::RiskAssessment;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for rendered results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Currency with thousands separators and cents, e.g. `$12,345.60`
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Probability as a percentage with one decimal, e.g. `25.0%`
pub fn format_percent(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn render_text(assessment: &RiskAssessment) -> String {
    format!(
        "Risk Assessment\n{}\nAction: {}\nChurn Probability: {}\nAverage Ticket Size: {}",
        assessment.tier.label(),
        assessment.recommendation,
        format_percent(assessment.probability),
        format_currency(assessment.avg_ticket_size)
    )
}

pub fn render_json(assessment: &RiskAssessment) -> serde_json::Result<String> {
    serde_json::to_string_pretty(assessment)
}

pub fn render(assessment: &RiskAssessment, format: OutputFormat) -> serde_json::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(assessment)),
        OutputFormat::Json => render_json(assessment),
    }
}

/// Feature vector as `column = value` lines in model order
pub fn render_features(features: &FeatureVector) -> String {
    let width = features.columns().iter().map(String::len).max().unwrap_or(0);
    features
        .iter()
        .map(|(column, value)| format!("  {:<width$} = {}", column, value, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Artifact summary for `inspect`
pub fn render_artifact(artifact: &ModelArtifact) -> String {
    let mut lines = vec![
        format!("Artifact: {}", artifact.source().display()),
        format!("Model: {}", artifact.classifier().kind()),
        format!("Columns ({}):", artifact.columns().len()),
    ];
    for (i, column) in artifact.columns().iter().enumerate() {
        lines.push(match artifact.defaults().get(column) {
            Some(default) => format!("  {:>2}. {} (default {})", i + 1, column, default),
            None => format!("  {:>2}. {}", i + 1, column),
        });
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::assessment::RiskThresholds;
    use crate::types::profile::CustomerProfile;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(4000.0 / 60.0), "$66.67");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(18500.0), "$18,500.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(-12.5), "-$12.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.25), "25.0%");
        assert_eq!(format_percent(0.8549), "85.5%");
    }

    #[test]
    fn test_render_text() {
        let assessment = RiskAssessment::new(
            CustomerProfile::default(),
            4000.0 / 60.0,
            0.85,
            &RiskThresholds::default(),
        );
        let text = render_text(&assessment);

        assert_eq!(
            text,
            "Risk Assessment\n\
             HIGH RISK\n\
             Action: Urgent retention action required.\n\
             Churn Probability: 85.0%\n\
             Average Ticket Size: $66.67"
        );
    }

    #[test]
    fn test_render_json() {
        let assessment = RiskAssessment::new(
            CustomerProfile::default(),
            66.67,
            0.25,
            &RiskThresholds::default(),
        );
        let json = render(&assessment, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tier"], "LOW");
        assert_eq!(value["profile"]["transaction_count"], 60);
    }

    #[test]
    fn test_render_artifact_and_features() {
        use crate::feature_extractor::{FeatureAssembler, FeatureExtractor};
        use crate::models::classifier::LogisticClassifier;
        use std::collections::BTreeMap;
        use std::path::PathBuf;

        let columns = vec!["Total_Trans_Ct".to_string(), "Customer_Age".to_string()];
        let mut defaults = BTreeMap::new();
        defaults.insert("Customer_Age".to_string(), 46.0);
        let classifier = LogisticClassifier::new(0.0, vec![0.1, 0.1], None).unwrap();
        let artifact = ModelArtifact::new(
            Box::new(classifier),
            columns.clone(),
            defaults.clone(),
            PathBuf::from("model/churn_model.json"),
        )
        .unwrap();

        let summary = render_artifact(&artifact);
        assert_eq!(
            summary.lines().collect::<Vec<_>>(),
            vec![
                "Artifact: model/churn_model.json",
                "Model: logistic",
                "Columns (2):",
                "   1. Total_Trans_Ct",
                "   2. Customer_Age (default 46)",
            ]
        );

        let assembler = FeatureAssembler::new(&columns, &defaults).unwrap();
        let vector = assembler.assemble(&FeatureExtractor::new().extract(&CustomerProfile::default()));
        assert_eq!(
            render_features(&vector),
            "  Total_Trans_Ct = 60\n  Customer_Age   = 46"
        );
    }
}
