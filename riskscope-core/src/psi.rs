//! Population Stability Index.
//!
//! PSI < 0.1 means no meaningful shift, 0.1-0.25 a moderate one, above 0.25 a
//! significant one.

/// Frequency assigned to empty buckets so the log term stays finite.
pub const EMPTY_BUCKET_FLOOR: f64 = 0.0001;

/// Relative frequency of `sample` in each of `buckets` equal-width bins over
/// `[lo, hi]`.
///
/// Bins are half-open except the last, which includes `hi`. Values outside
/// the range fall in no bin but still count toward the sample size.
pub fn bucket_frequencies(sample: &[f64], buckets: usize, lo: f64, hi: f64) -> Vec<f64> {
    let mut counts = vec![0usize; buckets];
    if sample.is_empty() || buckets == 0 {
        return vec![0.0; buckets];
    }
    let edges: Vec<f64> = (0..=buckets)
        .map(|i| lo + (hi - lo) * i as f64 / buckets as f64)
        .collect();

    for &v in sample {
        if v < lo || v > hi || v.is_nan() {
            continue;
        }
        let idx = if v == hi {
            buckets - 1
        } else {
            edges.partition_point(|e| *e <= v).saturating_sub(1)
        };
        counts[idx.min(buckets - 1)] += 1;
    }

    let n = sample.len() as f64;
    counts.into_iter().map(|c| c as f64 / n).collect()
}

/// PSI between an `expected` (baseline) and `actual` (current) sample over
/// `buckets` equal-width bins spanning `[0, 1]`.
pub fn population_stability_index(expected: &[f64], actual: &[f64], buckets: usize) -> f64 {
    let expected_pct = bucket_frequencies(expected, buckets, 0.0, 1.0);
    let actual_pct = bucket_frequencies(actual, buckets, 0.0, 1.0);

    expected_pct
        .into_iter()
        .zip(actual_pct)
        .map(|(e, a)| {
            let e = if e == 0.0 { EMPTY_BUCKET_FLOOR } else { e };
            let a = if a == 0.0 { EMPTY_BUCKET_FLOOR } else { a };
            (a - e) * (a / e).ln()
        })
        .sum()
}
