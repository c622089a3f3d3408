//! Toxicity: share of harmful text outputs.
//!
//! A configured classifier is tried first under a time budget. Errors,
//! timeouts, malformed results or no classifier at all fall back to the regex
//! lexicon, which always answers.

use super::MetricContext;
use crate::classifier::{KeywordClassifier, ToxicityClassifier};
use crate::columns::CanonicalField;
use crate::error::ScoringError;
use crate::stats::mean;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Non-empty texts from the text-output column, or `None` when the column is
/// missing.
pub fn collect_texts(ctx: &MetricContext<'_>) -> Option<Vec<String>> {
    let col = ctx.column(CanonicalField::TextOutput)?;
    Some(
        (0..ctx.row_count())
            .filter_map(|row| ctx.dataset.text(row, col))
            .filter(|t| !t.trim().is_empty())
            .collect(),
    )
}

/// Full toxicity score: classifier first, lexicon fallback.
pub async fn score(
    ctx: &MetricContext<'_>,
    classifier: Option<&dyn ToxicityClassifier>,
    timeout: Duration,
) -> f64 {
    let Some(texts) = collect_texts(ctx) else {
        warn!("No text output column found for toxicity scoring");
        return ctx.policy.no_text_score;
    };
    if texts.is_empty() {
        return ctx.policy.no_text_score;
    }

    if let Some(classifier) = classifier {
        let capped = &texts[..texts.len().min(ctx.policy.classifier_cap)];
        match classify_bounded(classifier, capped, timeout).await {
            Ok(avg) => {
                info!(backend = classifier.name(), toxicity = avg, "Toxicity (classifier)");
                return avg.clamp(0.0, 1.0);
            }
            Err(e) => {
                warn!(
                    backend = classifier.name(),
                    error = %e,
                    "Toxicity classifier failed, falling back to keyword detection"
                );
            }
        }
    }

    keyword_rate(&texts)
}

/// Lexicon-only score, used when no classifier is configured.
pub fn score_offline(ctx: &MetricContext<'_>) -> f64 {
    match collect_texts(ctx) {
        Some(texts) if !texts.is_empty() => keyword_rate(&texts),
        _ => ctx.policy.no_text_score,
    }
}

/// Call the classifier under `timeout` and average its scores.
async fn classify_bounded(
    classifier: &dyn ToxicityClassifier,
    texts: &[String],
    timeout: Duration,
) -> Result<f64, ScoringError> {
    let scores = match tokio::time::timeout(timeout, classifier.classify(texts)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ScoringError::timeout(format!(
                "{} did not answer within {}s",
                classifier.name(),
                timeout.as_secs()
            )));
        }
    };
    if scores.len() != texts.len() {
        return Err(ScoringError::classifier(format!(
            "expected {} scores, got {}",
            texts.len(),
            scores.len()
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !(0.0..=1.0).contains(*s)) {
        return Err(ScoringError::classifier(format!("score {bad} outside [0, 1]")));
    }
    mean(&scores).ok_or_else(|| ScoringError::classifier("no scores returned"))
}

/// Share of texts matching at least one toxic lexicon.
fn keyword_rate(texts: &[String]) -> f64 {
    let keyword = KeywordClassifier;
    let toxic = texts.iter().filter(|t| keyword.score(t) > 0.0).count();
    let rate = toxic as f64 / texts.len() as f64;
    debug!(toxic, total = texts.len(), "Keyword matches");
    info!(toxicity = rate, "Toxicity (keyword fallback)");
    rate
}
