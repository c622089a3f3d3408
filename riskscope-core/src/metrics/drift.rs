//! Drift: distribution shift between the first and second half of the data.
//!
//! Rows are assumed to be in chronological order: the first half is the
//! baseline, the second half the current window.

use super::{MetricContext, MetricKind, StrategyChain};
use crate::columns::CanonicalField;
use crate::psi::population_stability_index;
use crate::stats::{positive_rate, rescale_confidence};
use tracing::info;

pub fn chain(ctx: &MetricContext<'_>) -> StrategyChain {
    StrategyChain::new(MetricKind::Drift, ctx.policy.drift_unknown)
        .tier("small_sample", small_sample)
        .tier("confidence_psi", confidence_psi)
        .tier("decision_rate_shift", decision_rate_shift)
}

pub fn score(ctx: &MetricContext<'_>) -> f64 {
    chain(ctx).evaluate(ctx)
}

/// Too few rows for a divergence estimate: return the low-information constant.
pub fn small_sample(ctx: &MetricContext<'_>) -> Option<f64> {
    (ctx.row_count() < ctx.policy.drift_min_rows).then_some(ctx.policy.drift_small_sample)
}

fn midpoint(ctx: &MetricContext<'_>) -> usize {
    ctx.row_count() / 2
}

/// PSI of the confidence distribution, normalized so the significant-shift
/// threshold scores 1.0.
pub fn confidence_psi(ctx: &MetricContext<'_>) -> Option<f64> {
    let col = ctx.column(CanonicalField::Confidence)?;
    let mid = midpoint(ctx);
    let baseline = ctx.dataset.numeric_range(col, 0, mid);
    let current = ctx.dataset.numeric_range(col, mid, ctx.row_count());
    if baseline.is_empty() || current.is_empty() {
        return None;
    }
    let baseline = rescale_confidence(baseline);
    let current = rescale_confidence(current);

    let psi = population_stability_index(&baseline, &current, ctx.policy.psi_buckets);
    let score = (psi / ctx.policy.psi_divisor).min(1.0);
    info!(psi, score, "Drift PSI");
    Some(score)
}

/// Shift in positive-decision rate between the halves.
pub fn decision_rate_shift(ctx: &MetricContext<'_>) -> Option<f64> {
    let col = ctx.column(CanonicalField::Decision)?;
    let decisions = ctx.dataset.normalized_column(col);
    let (baseline, current) = decisions.split_at(midpoint(ctx));
    let shift = (positive_rate(current)? - positive_rate(baseline)?).abs();
    let score = (shift / ctx.policy.decision_shift_divisor).min(1.0);
    info!(shift, score, "Drift (decision rate shift)");
    Some(score)
}
