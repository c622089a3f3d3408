//! Toxicity classification backends.
//!
//! The scoring core only knows the [`ToxicityClassifier`] trait. The keyword
//! lexicon is always available; network-backed classifiers are optional and
//! any failure they report sends the toxicity metric back to the lexicon.

use crate::config::{ClassifierBackend, ClassifierConfig};
use crate::error::ScoringError;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Hate/threat/discrimination, insult, and violence/weapon lexicons.
static TOXIC_LEXICONS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(hate|kill|attack|threat|abuse|harass|discriminat|racist|sexist)\b",
        r"(?i)\b(idiot|stupid|moron|dumb|worthless|loser)\b",
        r"(?i)\b(bomb|weapon|violence|murder)\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Whether `text` matches any toxic lexicon.
pub fn matches_toxic_lexicon(text: &str) -> bool {
    TOXIC_LEXICONS.iter().any(|re| re.is_match(text))
}

/// Scores each text for toxicity in [0, 1].
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// One score per input text, in input order.
    async fn classify(&self, texts: &[String]) -> Result<Vec<f64>, ScoringError>;
}

/// Regex lexicon classifier: 1.0 when any lexicon matches, else 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn score(&self, text: &str) -> f64 {
        if matches_toxic_lexicon(text) { 1.0 } else { 0.0 }
    }
}

#[async_trait]
impl ToxicityClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, texts: &[String]) -> Result<Vec<f64>, ScoringError> {
        Ok(texts.iter().map(|t| self.score(t)).collect())
    }
}

/// Google Perspective API client (TOXICITY attribute).
pub struct PerspectiveClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PerspectiveClassifier {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    async fn analyze(&self, text: &str) -> Result<f64, ScoringError> {
        let body = serde_json::json!({
            "comment": { "text": text },
            "languages": ["en"],
            "requestedAttributes": { "TOXICITY": {} },
        });
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: AnalyzeResponse = response.json().await?;
        parsed
            .attribute_scores
            .toxicity
            .map(|t| t.summary_score.value)
            .ok_or_else(|| ScoringError::classifier("Perspective response had no TOXICITY score"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    attribute_scores: AttributeScores,
}

#[derive(Debug, Deserialize)]
struct AttributeScores {
    #[serde(rename = "TOXICITY")]
    toxicity: Option<AttributeScore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributeScore {
    summary_score: SummaryScore,
}

#[derive(Debug, Deserialize)]
struct SummaryScore {
    value: f64,
}

#[async_trait]
impl ToxicityClassifier for PerspectiveClassifier {
    fn name(&self) -> &str {
        "perspective"
    }

    async fn classify(&self, texts: &[String]) -> Result<Vec<f64>, ScoringError> {
        let mut scores = Vec::with_capacity(texts.len());
        for text in texts {
            scores.push(self.analyze(text).await?);
        }
        debug!(count = scores.len(), "Perspective classification complete");
        Ok(scores)
    }
}

/// Build the configured external classifier, if any.
///
/// The keyword backend needs no external classifier: the toxicity metric
/// uses the lexicon directly.
pub fn from_config(
    config: &ClassifierConfig,
) -> Result<Option<Arc<dyn ToxicityClassifier>>, ScoringError> {
    match config.backend {
        ClassifierBackend::Keyword => Ok(None),
        ClassifierBackend::Perspective => {
            let key = config
                .perspective_api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    ScoringError::config("perspective backend requires perspective_api_key")
                })?;
            Ok(Some(Arc::new(PerspectiveClassifier::new(
                config.perspective_endpoint.clone(),
                key,
            ))))
        }
    }
}
