//! End-to-end scoring scenarios over small hand-built datasets.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use riskscope_core::{
    CanonicalField, ColumnResolver, DataBatch, RiskLevel, RiskScorer, ScoringConfig, ScoringError,
    ToxicityClassifier,
};

fn records(rows: Vec<Value>) -> DataBatch {
    DataBatch::from_records(&rows).unwrap()
}

/// Loan decisions where group "a" is approved 90% of the time and "b" 10%.
fn skewed_loans() -> DataBatch {
    let mut rows = Vec::new();
    for i in 0..10 {
        rows.push(json!({
            "Model_Decision": if i < 9 { "Approved" } else { "Denied" },
            "Gender": "a",
            "extra_col": i,
        }));
    }
    for i in 0..10 {
        rows.push(json!({
            "Model_Decision": if i < 1 { "approved" } else { "denied" },
            "Gender": "b",
            "extra_col": i,
        }));
    }
    records(rows)
}

#[test]
fn bias_saturates_on_extreme_parity_gap() {
    let scores = RiskScorer::default().score_offline(&skewed_loans()).unwrap();
    assert_eq!(scores.bias, 1.0);
}

#[test]
fn hallucination_tracks_ground_truth() {
    let same = records(vec![
        json!({"decision": "yes", "ground_truth": "yes"}),
        json!({"decision": "no", "ground_truth": "no"}),
    ]);
    let flipped = records(vec![
        json!({"decision": "yes", "ground_truth": "no"}),
        json!({"decision": "no", "ground_truth": "yes"}),
    ]);
    let scorer = RiskScorer::default();
    assert_eq!(scorer.score_offline(&same).unwrap().hallucination, 0.0);
    assert_eq!(scorer.score_offline(&flipped).unwrap().hallucination, 1.0);
}

#[test]
fn drift_psi_clamps_at_threshold() {
    let stable: Vec<Value> = (0..40).map(|_| json!({"confidence": 0.9})).collect();
    let shifted: Vec<Value> = (0..40)
        .map(|i| json!({"confidence": if i < 20 { 0.9 } else { 0.1 }}))
        .collect();
    let scorer = RiskScorer::default();
    assert_eq!(scorer.score_offline(&records(stable)).unwrap().drift, 0.0);
    assert_eq!(scorer.score_offline(&records(shifted)).unwrap().drift, 1.0);
}

#[test]
fn data_leakage_single_email_in_four_rows() {
    let data = records(vec![
        json!({"response": "Please write to jane.doe@example.com"}),
        json!({"response": "Your claim is under review."}),
        json!({"response": "We have approved the request."}),
        json!({"response": "No further action is needed."}),
    ]);
    let scores = RiskScorer::default().score_offline(&data).unwrap();
    assert_eq!(scores.data_leakage, 0.25);
}

#[test]
fn missing_optional_columns_use_constants() {
    let data = records(vec![json!({"foo": 1, "bar": "x"}); 25]);
    let scores = RiskScorer::default().score_offline(&data).unwrap();
    assert_eq!(scores.robustness, 0.4);
    assert_eq!(scores.explainability, 0.75);
    assert_eq!(scores.toxicity, 0.1);
    assert_eq!(scores.data_leakage, 0.1);
    assert_eq!(scores.drift, 0.25);
}

#[test]
fn resolution_ignores_case_and_extra_columns() {
    let data = skewed_loans();
    let resolver = ColumnResolver::new(&data.columns);
    assert_eq!(
        resolver.resolve(CanonicalField::Decision),
        Some("Model_Decision")
    );
    assert_eq!(resolver.resolve(CanonicalField::Gender), Some("Gender"));
    assert_eq!(resolver.resolve(CanonicalField::TextOutput), None);
}

#[test]
fn policy_overrides_change_normalization() {
    let mut config = ScoringConfig::default();
    config.policy.drift_min_rows = 10;
    let data = records((0..12).map(|_| json!({"confidence": 0.5})).collect());
    let scores = RiskScorer::new(config).score_offline(&data).unwrap();
    // 12 rows clear the lowered floor; identical halves have no drift.
    assert_eq!(scores.drift, 0.0);
}

#[test]
fn summary_bands_scores() {
    let scores = RiskScorer::default().score_offline(&skewed_loans()).unwrap();
    let summary = scores.summary();
    assert_eq!(summary.levels[&riskscope_core::MetricKind::Bias], RiskLevel::Critical);
    assert!(summary.critical >= 1);
}

struct StalledClassifier;

#[async_trait]
impl ToxicityClassifier for StalledClassifier {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn classify(&self, texts: &[String]) -> Result<Vec<f64>, ScoringError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![1.0; texts.len()])
    }
}

struct HalfClassifier;

#[async_trait]
impl ToxicityClassifier for HalfClassifier {
    fn name(&self) -> &str {
        "half"
    }

    async fn classify(&self, texts: &[String]) -> Result<Vec<f64>, ScoringError> {
        Ok(vec![0.5; texts.len()])
    }
}

fn chat_log() -> DataBatch {
    records(vec![
        json!({"answer": "You are a moron", "confidence": 0.9}),
        json!({"answer": "Happy to help", "confidence": 0.8}),
        json!({"answer": "Anything else?", "confidence": 0.85}),
        json!({"answer": "Goodbye", "confidence": 0.95}),
    ])
}

#[tokio::test(start_paused = true)]
async fn stalled_classifier_degrades_to_keywords() {
    let mut config = ScoringConfig::default();
    config.classifier.timeout_secs = 2;
    let scorer = RiskScorer::new(config).with_classifier(Arc::new(StalledClassifier));
    let data = chat_log();
    let online = scorer.score(&data).await.unwrap();
    let offline = scorer.score_offline(&data).unwrap();
    assert_eq!(online.toxicity, 0.25);
    assert_eq!(online, offline);
}

#[tokio::test]
async fn classifier_scores_replace_keywords() {
    let scorer = RiskScorer::default().with_classifier(Arc::new(HalfClassifier));
    let scores = scorer.score(&chat_log()).await.unwrap();
    assert_eq!(scores.toxicity, 0.5);
}
