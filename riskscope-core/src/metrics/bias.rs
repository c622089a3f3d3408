//! Bias: demographic parity gap across protected attributes.
//!
//! 0 = equal positive-outcome rates for every group, 1 = complete disparity.

use super::{MetricContext, MetricKind, StrategyChain};
use crate::columns::CanonicalField;
use crate::stats::{is_positive, mean, std_dev};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub fn chain(ctx: &MetricContext<'_>) -> StrategyChain {
    StrategyChain::new(MetricKind::Bias, ctx.policy.bias_unknown)
        .tier("parity_gap", parity_gap)
        .tier("confidence_spread", confidence_spread)
}

pub fn score(ctx: &MetricContext<'_>) -> f64 {
    chain(ctx).evaluate(ctx)
}

/// Mean parity gap over the protected attributes with at least two groups of
/// `min_group_size` rows, divided by the complete-disparity gap.
pub fn parity_gap(ctx: &MetricContext<'_>) -> Option<f64> {
    let Some(decision_col) = ctx.column(CanonicalField::Decision) else {
        warn!("No decision column found for bias computation");
        return None;
    };
    let positive: Vec<bool> = ctx
        .dataset
        .normalized_column(decision_col)
        .iter()
        .map(|d| is_positive(d))
        .collect();

    let mut gaps = Vec::new();
    for field in CanonicalField::PROTECTED {
        let Some(col) = ctx.column(field) else {
            continue;
        };
        let groups = ctx.dataset.normalized_column(col);
        let rates = group_rates(&groups, &positive, ctx.policy.min_group_size);
        if rates.len() < 2 {
            debug!(attribute = col, groups = rates.len(), "Too few qualifying groups");
            continue;
        }
        let max = rates.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = rates.values().copied().fold(f64::INFINITY, f64::min);
        let gap = max - min;
        info!(attribute = col, gap, groups = ?rates, "Bias gap");
        gaps.push(gap);
    }

    let avg_gap = mean(&gaps)?;
    Some((avg_gap / ctx.policy.bias_gap_divisor).min(1.0))
}

/// Positive rate per group, skipping groups below the size floor.
fn group_rates(groups: &[String], positive: &[bool], min_size: usize) -> BTreeMap<String, f64> {
    let mut tally: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (group, pos) in groups.iter().zip(positive) {
        let entry = tally.entry(group.as_str()).or_default();
        entry.0 += 1;
        if *pos {
            entry.1 += 1;
        }
    }
    tally
        .into_iter()
        .filter(|(_, (n, _))| *n >= min_size)
        .map(|(g, (n, p))| (g.to_string(), p as f64 / n as f64))
        .collect()
}

/// Spread of the raw confidence values as a proxy when no gap is measurable.
pub fn confidence_spread(ctx: &MetricContext<'_>) -> Option<f64> {
    let conf = ctx.raw_confidence()?;
    Some((std_dev(&conf) * ctx.policy.bias_std_multiplier).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::*;
    use serde_json::{Value, json};

    fn rows(groups: &[(&str, usize, usize)]) -> Vec<Vec<Value>> {
        // (group, total, positives)
        let mut out = Vec::new();
        for (group, total, positives) in groups {
            for i in 0..*total {
                let decision = if i < *positives { "approved" } else { "denied" };
                out.push(vec![json!(decision), json!(group)]);
            }
        }
        out
    }

    #[test]
    fn test_extreme_gap_saturates() {
        let data = batch(
            &["decision", "gender"],
            rows(&[("m", 10, 9), ("f", 10, 1)]),
        );
        let gap = with_ctx(&data, parity_gap).unwrap();
        assert_eq!(gap, 1.0);
        assert_eq!(with_ctx(&data, score), 1.0);
    }

    #[test]
    fn test_gap_of_point_two_scores_half() {
        let data = batch(
            &["Decision", "Race"],
            rows(&[("a", 10, 6), ("b", 10, 4)]),
        );
        let s = with_ctx(&data, score);
        assert!((s - 0.5).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn test_small_groups_ignored() {
        let data = batch(
            &["decision", "gender"],
            rows(&[("m", 10, 10), ("f", 4, 0)]),
        );
        assert_eq!(with_ctx(&data, parity_gap), None);
        // No confidence column either: medium-risk constant.
        assert_eq!(with_ctx(&data, score), 0.3);
    }

    #[test]
    fn test_gaps_averaged_across_attributes() {
        let mut data_rows = Vec::new();
        for i in 0..20 {
            let gender = if i < 10 { "m" } else { "f" };
            let age = if i % 2 == 0 { "young" } else { "old" };
            // m: all approved, f: none; age groups split evenly.
            let decision = if i < 10 { "yes" } else { "no" };
            data_rows.push(vec![json!(decision), json!(gender), json!(age)]);
        }
        let data = batch(&["decision", "sex", "age_group"], data_rows);
        // gender gap 1.0, age gap 0.0 -> mean 0.5 -> 0.5 / 0.4 capped at 1.0
        assert_eq!(with_ctx(&data, parity_gap), Some(1.0));
    }

    #[test]
    fn test_fallback_to_confidence_spread() {
        let data = batch(
            &["confidence"],
            vec![vec![json!(0.1)], vec![json!(0.2)], vec![json!(0.3)]],
        );
        let s = with_ctx(&data, score);
        assert!((s - 0.2).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn test_null_attribute_forms_own_group() {
        let mut data_rows = rows(&[("m", 5, 5)]);
        for _ in 0..5 {
            data_rows.push(vec![json!("no"), Value::Null]);
        }
        let data = batch(&["decision", "gender"], data_rows);
        assert_eq!(with_ctx(&data, parity_gap), Some(1.0));
    }
}
