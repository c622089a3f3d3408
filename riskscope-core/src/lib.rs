//! # riskscope-core: risk-exposure scoring for model output datasets
//!
//! Computes seven normalized risk scores from a loosely-schematized table of a
//! deployed model's recorded behavior (decisions, confidence values, free text,
//! demographic attributes):
//!
//! 1. **Bias**: demographic parity gap across gender, race and age groups
//! 2. **Hallucination**: decision vs ground-truth mismatch rate
//! 3. **Toxicity**: pluggable classifier with a regex lexicon fallback
//! 4. **Robustness**: confidence instability and non-determinism
//! 5. **Explainability**: explanation coverage and confidence calibration
//! 6. **Data leakage**: PII-shaped patterns in text outputs
//! 7. **Drift**: Population Stability Index between the two halves of the data
//!
//! Every score lies in `[0, 1]`, where 0 means no risk. Each metric degrades to
//! a documented fallback when the columns it needs are missing, so
//! [`RiskScorer::score`] always returns a complete [`ScoreSet`] for a
//! non-empty dataset.

pub mod classifier;
pub mod columns;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod psi;
pub mod report;
pub mod scorer;
pub mod stats;

// Re-exports
pub use classifier::{KeywordClassifier, PerspectiveClassifier, ToxicityClassifier};
pub use columns::{CanonicalField, ColumnResolver};
pub use config::{ClassifierBackend, ClassifierConfig, PolicyConstants, ScoringConfig};
pub use dataset::{DataBatch, Dataset};
pub use error::ScoringError;
pub use metrics::MetricKind;
pub use report::{RiskLevel, RiskSummary};
pub use scorer::{RiskScorer, ScoreSet};
