//! Error types for the riskscope-core crate.

use thiserror::Error;

/// Top-level error type for scoring operations.
///
/// Per-metric problems never surface here: a missing or unparseable column
/// degrades that metric to its fallback. Only dataset-shape violations reach
/// the caller, plus classifier errors inside the toxicity call site (which
/// are caught there).
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ScoringError {
    pub fn invalid_dataset(msg: impl Into<String>) -> Self {
        Self::InvalidDataset(msg.into())
    }

    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for ScoringError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
