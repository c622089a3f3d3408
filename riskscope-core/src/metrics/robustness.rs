//! Robustness: how unstable the model's outputs look.
//!
//! Up to three independent signals are averaged: confidence variance, the
//! low-confidence rate, and non-determinism (same prompt, different
//! decisions).

use super::{MetricContext, MetricKind, StrategyChain};
use crate::columns::CanonicalField;
use crate::stats::{fraction, mean, std_dev};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

pub fn chain(ctx: &MetricContext<'_>) -> StrategyChain {
    StrategyChain::new(MetricKind::Robustness, ctx.policy.robustness_unknown)
        .tier("signal_mean", signal_mean)
}

pub fn score(ctx: &MetricContext<'_>) -> f64 {
    chain(ctx).evaluate(ctx)
}

/// Mean of whichever signals are computable.
pub fn signal_mean(ctx: &MetricContext<'_>) -> Option<f64> {
    let mut signals = Vec::new();
    if let Some(conf) = ctx.confidence() {
        signals.push(variance_signal(&conf, ctx.policy.robustness_std_multiplier));
        if let Some(low) = fraction(&conf, |c| *c < ctx.policy.robustness_confidence_cutoff) {
            signals.push(low);
        }
    }
    if let Some(rate) = non_determinism(ctx) {
        info!(non_deterministic_rate = rate, "Non-determinism rate");
        signals.push(rate);
    }
    let result = mean(&signals)?;
    info!(robustness = result, signals = signals.len(), "Robustness score");
    Some(result)
}

fn variance_signal(conf: &[f64], multiplier: f64) -> f64 {
    (std_dev(conf) * multiplier).min(1.0)
}

/// Share of distinct prompts that received more than one distinct decision.
pub fn non_determinism(ctx: &MetricContext<'_>) -> Option<f64> {
    let prompt_col = ctx.column(CanonicalField::Prompt)?;
    let decision_col = ctx.column(CanonicalField::Decision)?;
    let prompts = ctx.dataset.normalized_column(prompt_col);

    let mut decisions_by_prompt: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for (row, prompt) in prompts.iter().enumerate() {
        let distinct = decisions_by_prompt.entry(prompt.as_str()).or_default();
        if let Some(decision) = ctx.dataset.text(row, decision_col) {
            distinct.insert(crate::dataset::normalize(&decision));
        }
    }

    let groups: Vec<usize> = decisions_by_prompt.values().map(BTreeSet::len).collect();
    fraction(&groups, |n| *n > 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::*;
    use serde_json::json;

    #[test]
    fn test_no_signals_returns_constant() {
        let data = column("notes", vec![json!("x"), json!("y")]);
        assert_eq!(with_ctx(&data, score), 0.4);
    }

    #[test]
    fn test_confidence_signals() {
        // std = 0 -> variance signal 0; both below 0.55 -> low-confidence 1.0
        let data = column("confidence", vec![json!(0.5), json!(0.5)]);
        assert_eq!(with_ctx(&data, score), 0.5);
    }

    #[test]
    fn test_non_determinism_only() {
        let data = batch(
            &["Question", "output"],
            vec![
                vec![json!("Can I get a loan?"), json!("yes")],
                vec![json!("can i get a loan? "), json!("no")],
                vec![json!("What is 2+2?"), json!("4")],
                vec![json!("What is 2+2?"), json!("4")],
            ],
        );
        assert_eq!(with_ctx(&data, non_determinism), Some(0.5));
        assert_eq!(with_ctx(&data, score), 0.5);
    }

    #[test]
    fn test_all_three_signals_averaged() {
        let data = batch(
            &["prompt", "decision", "confidence"],
            vec![
                vec![json!("p1"), json!("yes"), json!(0.9)],
                vec![json!("p1"), json!("yes"), json!(0.9)],
                vec![json!("p2"), json!("no"), json!(0.9)],
            ],
        );
        // variance 0, low-confidence 0, non-determinism 0
        assert_eq!(with_ctx(&data, score), 0.0);
    }

    #[test]
    fn test_variance_signal_capped() {
        let data = column("confidence", vec![json!(0.0), json!(1.0)]);
        let s = with_ctx(&data, signal_mean).unwrap();
        // variance signal capped at 1.0, low-confidence 0.5
        assert!((s - 0.75).abs() < 1e-12);
    }
}
