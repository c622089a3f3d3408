//! Hallucination: how often the model's decision disagrees with ground truth.
//!
//! Without ground truth, the share of low-confidence answers stands in.

use super::{MetricContext, MetricKind, StrategyChain};
use crate::columns::CanonicalField;
use crate::stats::fraction;
use tracing::info;

pub fn chain(ctx: &MetricContext<'_>) -> StrategyChain {
    StrategyChain::new(MetricKind::Hallucination, ctx.policy.hallucination_unknown)
        .tier("ground_truth_mismatch", mismatch_rate)
        .tier("low_confidence", low_confidence_rate)
}

pub fn score(ctx: &MetricContext<'_>) -> f64 {
    chain(ctx).evaluate(ctx)
}

/// Share of rows whose normalized decision differs from the normalized truth.
pub fn mismatch_rate(ctx: &MetricContext<'_>) -> Option<f64> {
    let decision_col = ctx.column(CanonicalField::Decision)?;
    let truth_col = ctx.column(CanonicalField::GroundTruth)?;
    let predictions = ctx.dataset.normalized_column(decision_col);
    let truth = ctx.dataset.normalized_column(truth_col);

    let pairs: Vec<_> = predictions.iter().zip(&truth).collect();
    let rate = fraction(&pairs, |(p, t)| p != t)?;
    info!(mismatch_rate = rate, "Hallucination (mismatch rate)");
    Some(rate)
}

/// Share of confidence values below the hallucination cutoff.
pub fn low_confidence_rate(ctx: &MetricContext<'_>) -> Option<f64> {
    let conf = ctx.confidence()?;
    let cutoff = ctx.policy.hallucination_confidence_cutoff;
    let rate = fraction(&conf, |c| *c < cutoff)?;
    info!(low_conf_rate = rate, "Hallucination (low-confidence proxy)");
    Some(rate)
}
