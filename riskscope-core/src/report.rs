//! Risk banding and summary figures for a [`ScoreSet`].
//!
//! Narrative text and compliance mapping belong to the report layer; this
//! module only derives the numbers it needs.

use crate::metrics::MetricKind;
use crate::scorer::ScoreSet;
use crate::stats::round4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity band for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::Critical
        } else if score >= 0.50 {
            Self::High
        } else if score >= 0.25 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Aggregate view over all seven scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub avg_score: f64,
    pub overall_risk: RiskLevel,
    /// `round((1 - avg) * 100)`.
    pub readiness_pct: u8,
    pub critical: usize,
    pub high: usize,
    pub levels: BTreeMap<MetricKind, RiskLevel>,
}

impl RiskSummary {
    pub fn from_scores(scores: &ScoreSet) -> Self {
        let levels: BTreeMap<MetricKind, RiskLevel> = scores
            .iter()
            .map(|(m, s)| (m, RiskLevel::from_score(s)))
            .collect();
        let avg = scores.iter().map(|(_, s)| s).sum::<f64>() / MetricKind::ALL.len() as f64;
        let count = |level: RiskLevel| levels.values().filter(|l| **l == level).count();

        Self {
            avg_score: round4(avg),
            overall_risk: RiskLevel::from_score(avg),
            readiness_pct: ((1.0 - avg) * 100.0).round().clamp(0.0, 100.0) as u8,
            critical: count(RiskLevel::Critical),
            high: count(RiskLevel::High),
            levels,
        }
    }
}

impl ScoreSet {
    pub fn summary(&self) -> RiskSummary {
        RiskSummary::from_scores(self)
    }
}
