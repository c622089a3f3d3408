//! Aggregator: runs all seven metrics over one dataset snapshot.

use crate::classifier::{self, ToxicityClassifier};
use crate::columns::ColumnResolver;
use crate::config::ScoringConfig;
use crate::dataset::Dataset;
use crate::error::ScoringError;
use crate::metrics::{
    MetricContext, MetricKind, bias, drift, explainability, hallucination, leakage, robustness,
    toxicity,
};
use crate::stats::round4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// The seven risk scores for one dataset, each in [0, 1] and rounded to four
/// decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSet {
    pub bias: f64,
    pub hallucination: f64,
    pub toxicity: f64,
    pub robustness: f64,
    pub explainability: f64,
    pub data_leakage: f64,
    pub drift: f64,
}

impl ScoreSet {
    /// Clamp each raw score to [0, 1] and round it to four decimals.
    fn from_raw(raw: [f64; 7]) -> Self {
        let [bias, hallucination, toxicity, robustness, explainability, data_leakage, drift] =
            raw.map(|v| round4(if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }));
        Self {
            bias,
            hallucination,
            toxicity,
            robustness,
            explainability,
            data_leakage,
            drift,
        }
    }

    pub fn get(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Bias => self.bias,
            MetricKind::Hallucination => self.hallucination,
            MetricKind::Toxicity => self.toxicity,
            MetricKind::Robustness => self.robustness,
            MetricKind::Explainability => self.explainability,
            MetricKind::DataLeakage => self.data_leakage,
            MetricKind::Drift => self.drift,
        }
    }

    /// `(metric, score)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        MetricKind::ALL.into_iter().map(|m| (m, self.get(m)))
    }

    /// Key -> score mapping with exactly the seven metric keys.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        self.iter().map(|(m, s)| (m.key(), s)).collect()
    }
}

/// Runs the seven metric computers.
///
/// Metrics share nothing mutable, so the only coordination is waiting for
/// the toxicity classifier, which is bounded by the configured timeout.
/// Dropping the future returned by [`RiskScorer::score`] cancels the whole
/// computation; no partial [`ScoreSet`] is ever produced.
#[derive(Clone)]
pub struct RiskScorer {
    config: ScoringConfig,
    classifier: Option<Arc<dyn ToxicityClassifier>>,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}

impl RiskScorer {
    /// Scorer with no external classifier (regex toxicity only).
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            classifier: None,
        }
    }

    /// Scorer with the classifier backend named in `config`.
    pub fn from_config(config: ScoringConfig) -> Result<Self, ScoringError> {
        config.policy.validate()?;
        let classifier = classifier::from_config(&config.classifier)?;
        Ok(Self { config, classifier })
    }

    /// Replace the toxicity classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn ToxicityClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a dataset, consulting the toxicity classifier if one is set.
    pub async fn score(&self, dataset: &dyn Dataset) -> Result<ScoreSet, ScoringError> {
        check_non_empty(dataset)?;
        let columns = ColumnResolver::new(dataset.columns());
        let ctx = MetricContext::new(dataset, &columns, &self.config.policy);
        log_start(dataset);

        let timeout = self.config.classifier.timeout();
        let (tox, rest) = tokio::join!(
            toxicity::score(&ctx, self.classifier.as_deref(), timeout),
            async { synchronous_metrics(&ctx) },
        );
        Ok(assemble(tox, rest))
    }

    /// Score a dataset without any external call; toxicity uses the regex
    /// lexicon. Deterministic for a given dataset and config.
    pub fn score_offline(&self, dataset: &dyn Dataset) -> Result<ScoreSet, ScoringError> {
        check_non_empty(dataset)?;
        let columns = ColumnResolver::new(dataset.columns());
        let ctx = MetricContext::new(dataset, &columns, &self.config.policy);
        log_start(dataset);

        let tox = toxicity::score_offline(&ctx);
        Ok(assemble(tox, synchronous_metrics(&ctx)))
    }
}

fn check_non_empty(dataset: &dyn Dataset) -> Result<(), ScoringError> {
    if dataset.row_count() == 0 {
        return Err(ScoringError::EmptyDataset);
    }
    Ok(())
}

fn log_start(dataset: &dyn Dataset) {
    info!(
        rows = dataset.row_count(),
        columns = ?dataset.columns(),
        "Computing risk scores"
    );
}

/// Every metric except toxicity: [bias, hallucination, robustness,
/// explainability, data_leakage, drift].
fn synchronous_metrics(ctx: &MetricContext<'_>) -> [f64; 6] {
    [
        bias::score(ctx),
        hallucination::score(ctx),
        robustness::score(ctx),
        explainability::score(ctx),
        leakage::score(ctx),
        drift::score(ctx),
    ]
}

fn assemble(toxicity: f64, rest: [f64; 6]) -> ScoreSet {
    let [bias, hallucination, robustness, explainability, data_leakage, drift] = rest;
    let scores = ScoreSet::from_raw([
        bias,
        hallucination,
        toxicity,
        robustness,
        explainability,
        data_leakage,
        drift,
    ]);
    info!(scores = ?scores.to_map(), "Final scores");
    scores
}
