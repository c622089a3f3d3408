//! Small descriptive statistics shared by the metric computers.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Decision values that count as a positive outcome (after trim + lowercase).
pub static POSITIVE_OUTCOMES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ["approved", "yes", "accept", "1", "true", "positive", "pass"]
        .into_iter()
        .collect()
});

/// Whether a normalized decision counts as positive.
pub fn is_positive(decision: &str) -> bool {
    POSITIVE_OUTCOMES.contains(decision)
}

/// Share of normalized decisions that are positive. `None` when empty.
pub fn positive_rate<S: AsRef<str>>(decisions: &[S]) -> Option<f64> {
    fraction(decisions, |d| is_positive(d.as_ref()))
}

/// Arithmetic mean. `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// Fewer than two values carry no spread information and yield 0.0.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Share of items satisfying `pred`. `None` when empty.
pub fn fraction<T>(items: &[T], pred: impl Fn(&T) -> bool) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    Some(items.iter().filter(|v| pred(v)).count() as f64 / items.len() as f64)
}

/// Rescale confidence values to [0, 1].
///
/// Values are treated as percentages when the maximum exceeds 1.
pub fn rescale_confidence(values: Vec<f64>) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 1.0 {
        values.into_iter().map(|v| v / 100.0).collect()
    } else {
        values
    }
}

/// Round to four decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
