//! Explainability: how opaque the model's decisions are.
//!
//! Outputs that ship their own explanations are well explained. Otherwise,
//! confidence clustered around a coin flip or swinging widely marks a model
//! whose decisions are hard to justify.

use super::{MetricContext, MetricKind, StrategyChain};
use crate::columns::CanonicalField;
use crate::stats::{fraction, std_dev};
use tracing::info;

pub fn chain(ctx: &MetricContext<'_>) -> StrategyChain {
    StrategyChain::new(MetricKind::Explainability, ctx.policy.opaque_score)
        .tier("explanation_coverage", explanation_coverage)
        .tier("confidence_calibration", confidence_calibration)
}

pub fn score(ctx: &MetricContext<'_>) -> f64 {
    chain(ctx).evaluate(ctx)
}

/// The well-explained score when enough rows carry a substantive explanation.
pub fn explanation_coverage(ctx: &MetricContext<'_>) -> Option<f64> {
    let col = ctx.column(CanonicalField::Explanation)?;
    let min_len = ctx.policy.explanation_min_len;
    let rows: Vec<usize> = (0..ctx.row_count()).collect();
    let covered = fraction(&rows, |row| {
        ctx.dataset
            .text(*row, col)
            .is_some_and(|t| t.trim().chars().count() > min_len)
    })?;
    info!(coverage = covered, "Explanation coverage");
    (covered >= ctx.policy.explanation_coverage).then_some(ctx.policy.explained_score)
}

/// Weighted share of coin-flip confidences plus a capped variance penalty.
pub fn confidence_calibration(ctx: &MetricContext<'_>) -> Option<f64> {
    let conf = ctx.confidence()?;
    let policy = ctx.policy;
    let near_coin_flip = fraction(&conf, |c| {
        *c > policy.uncertainty_band_low && *c < policy.uncertainty_band_high
    })?;
    let variance_penalty =
        (std_dev(&conf) * policy.explainability_std_multiplier).min(policy.explainability_variance_cap);
    let score = near_coin_flip * policy.uncertainty_weight + variance_penalty;
    info!(explainability = score, near_coin_flip, variance_penalty, "Explainability score");
    Some(score.min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::*;
    use serde_json::{Value, json};

    #[test]
    fn test_opaque_default() {
        let data = column("id", vec![json!(1), json!(2)]);
        assert_eq!(with_ctx(&data, score), 0.75);
    }

    #[test]
    fn test_explanations_short_circuit() {
        let data = batch(
            &["reasoning", "confidence"],
            vec![
                vec![json!("income exceeds threshold"), json!(0.5)],
                vec![json!("credit history too short"), json!(0.5)],
                vec![json!("debt ratio acceptable"), json!(0.5)],
                vec![json!("stable employment record"), json!(0.5)],
                vec![json!("n/a"), json!(0.5)],
            ],
        );
        // 4 of 5 rows explained = exactly 80%
        assert_eq!(with_ctx(&data, score), 0.15);
    }

    #[test]
    fn test_sparse_explanations_fall_through() {
        let data = batch(
            &["explanation", "confidence"],
            vec![
                vec![json!("because the model said so"), json!(0.5)],
                vec![json!("short"), json!(0.5)],
                vec![Value::Null, json!(0.5)],
                vec![json!(""), json!(0.5)],
            ],
        );
        assert_eq!(with_ctx(&data, explanation_coverage), None);
        // all confidences in the band, no variance: 1.0 * 0.6 + 0
        let s = with_ctx(&data, score);
        assert!((s - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_band_is_exclusive() {
        let data = column("confidence", vec![json!(45), json!(55), json!(50), json!(50)]);
        let s = with_ctx(&data, confidence_calibration).unwrap();
        let sd = std_dev(&[0.45, 0.55, 0.5, 0.5]);
        assert!((s - (0.5 * 0.6 + sd * 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_variance_penalty_capped() {
        let data = column("confidence", vec![json!(0.0), json!(1.0), json!(0.0), json!(1.0)]);
        let s = with_ctx(&data, confidence_calibration).unwrap();
        assert_eq!(s, 0.5);
    }
}
