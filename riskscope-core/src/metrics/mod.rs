//! The seven metric computers.
//!
//! Each metric is an ordered chain of tiers: a tier returns `Some(score)` when
//! the data it needs is present and `None` otherwise, and the first tier that
//! produces a finite value wins. When no tier applies the chain returns the
//! metric's constant fallback. Tiers are plain functions so each one can be
//! tested on its own.

pub mod bias;
pub mod drift;
pub mod explainability;
pub mod hallucination;
pub mod leakage;
pub mod robustness;
pub mod toxicity;

use crate::columns::{CanonicalField, ColumnResolver};
use crate::config::PolicyConstants;
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The seven risk dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Bias,
    Hallucination,
    Toxicity,
    Robustness,
    Explainability,
    DataLeakage,
    Drift,
}

impl MetricKind {
    pub const ALL: [MetricKind; 7] = [
        MetricKind::Bias,
        MetricKind::Hallucination,
        MetricKind::Toxicity,
        MetricKind::Robustness,
        MetricKind::Explainability,
        MetricKind::DataLeakage,
        MetricKind::Drift,
    ];

    /// Key used in the score mapping.
    pub fn key(self) -> &'static str {
        match self {
            Self::Bias => "bias",
            Self::Hallucination => "hallucination",
            Self::Toxicity => "toxicity",
            Self::Robustness => "robustness",
            Self::Explainability => "explainability",
            Self::DataLeakage => "data_leakage",
            Self::Drift => "drift",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bias => "Bias / Fairness",
            Self::Hallucination => "Hallucination Rate",
            Self::Toxicity => "Toxicity",
            Self::Robustness => "Robustness Risk",
            Self::Explainability => "Explainability Gap",
            Self::DataLeakage => "Data Leakage Risk",
            Self::Drift => "Model Drift",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Read-only inputs shared by every metric for one scoring call.
#[derive(Clone, Copy)]
pub struct MetricContext<'a> {
    pub dataset: &'a dyn Dataset,
    pub columns: &'a ColumnResolver,
    pub policy: &'a PolicyConstants,
}

impl<'a> MetricContext<'a> {
    pub fn new(
        dataset: &'a dyn Dataset,
        columns: &'a ColumnResolver,
        policy: &'a PolicyConstants,
    ) -> Self {
        Self {
            dataset,
            columns,
            policy,
        }
    }

    pub fn column(&self, field: CanonicalField) -> Option<&'a str> {
        self.columns.resolve(field)
    }

    pub fn row_count(&self) -> usize {
        self.dataset.row_count()
    }

    /// Parseable confidence values rescaled to [0, 1]; `None` when the
    /// column is missing or holds no numbers.
    pub fn confidence(&self) -> Option<Vec<f64>> {
        let col = self.column(CanonicalField::Confidence)?;
        let values = self.dataset.numeric_column(col);
        (!values.is_empty()).then(|| crate::stats::rescale_confidence(values))
    }

    /// Raw parseable confidence values, without rescaling.
    pub fn raw_confidence(&self) -> Option<Vec<f64>> {
        let col = self.column(CanonicalField::Confidence)?;
        let values = self.dataset.numeric_column(col);
        (!values.is_empty()).then_some(values)
    }
}

/// A single strategy in a metric's fallback chain.
pub type Tier = fn(&MetricContext<'_>) -> Option<f64>;

/// Ordered tiers plus a constant used when none of them applies.
pub struct StrategyChain {
    metric: MetricKind,
    tiers: Vec<(&'static str, Tier)>,
    fallback: f64,
}

impl StrategyChain {
    pub fn new(metric: MetricKind, fallback: f64) -> Self {
        Self {
            metric,
            tiers: Vec::new(),
            fallback,
        }
    }

    pub fn tier(mut self, name: &'static str, tier: Tier) -> Self {
        self.tiers.push((name, tier));
        self
    }

    /// Run tiers in order and return the first finite score, clamped to [0, 1].
    pub fn evaluate(&self, ctx: &MetricContext<'_>) -> f64 {
        for (name, tier) in &self.tiers {
            if let Some(score) = tier(ctx).filter(|s| s.is_finite()) {
                let score = score.clamp(0.0, 1.0);
                debug!(metric = %self.metric, tier = *name, score, "Metric tier applied");
                return score;
            }
        }
        debug!(metric = %self.metric, score = self.fallback, "Metric fell back to constant");
        self.fallback
    }
}
