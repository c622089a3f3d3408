//! Configuration for the scoring core.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment. The defaults reproduce the policy
//! constants the metrics were calibrated against; override them only when a
//! policy change says so.

use crate::error::ScoringError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level scoring configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Normalization constants, thresholds and fallback values.
    #[serde(default)]
    pub policy: PolicyConstants,
    /// Toxicity classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Named policy constants used by the metric computers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConstants {
    /// Parity gap treated as complete disparity (a 0.2 gap scores 0.5).
    #[serde(default = "default_bias_gap_divisor")]
    pub bias_gap_divisor: f64,
    /// Groups smaller than this are ignored when computing parity gaps.
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
    /// Multiplier applied to confidence std in the bias fallback.
    #[serde(default = "default_bias_std_multiplier")]
    pub bias_std_multiplier: f64,
    #[serde(default = "default_bias_unknown")]
    pub bias_unknown: f64,

    /// Confidence below this counts as a likely hallucination.
    #[serde(default = "default_hallucination_confidence_cutoff")]
    pub hallucination_confidence_cutoff: f64,
    #[serde(default = "default_hallucination_unknown")]
    pub hallucination_unknown: f64,

    /// Maximum number of texts sent to the toxicity classifier.
    #[serde(default = "default_classifier_cap")]
    pub classifier_cap: usize,
    /// Score when no text column exists (toxicity and data leakage).
    #[serde(default = "default_no_text_score")]
    pub no_text_score: f64,

    /// Multiplier applied to confidence std in the robustness variance signal.
    #[serde(default = "default_robustness_std_multiplier")]
    pub robustness_std_multiplier: f64,
    /// Confidence below this counts as low-confidence for robustness.
    #[serde(default = "default_robustness_confidence_cutoff")]
    pub robustness_confidence_cutoff: f64,
    #[serde(default = "default_robustness_unknown")]
    pub robustness_unknown: f64,

    /// Share of rows that must carry an explanation to short-circuit.
    #[serde(default = "default_explanation_coverage")]
    pub explanation_coverage: f64,
    /// Explanations must be longer than this many characters.
    #[serde(default = "default_explanation_min_len")]
    pub explanation_min_len: usize,
    #[serde(default = "default_explained_score")]
    pub explained_score: f64,
    /// Exclusive lower bound of the "coin flip" confidence band.
    #[serde(default = "default_uncertainty_band_low")]
    pub uncertainty_band_low: f64,
    /// Exclusive upper bound of the "coin flip" confidence band.
    #[serde(default = "default_uncertainty_band_high")]
    pub uncertainty_band_high: f64,
    #[serde(default = "default_uncertainty_weight")]
    pub uncertainty_weight: f64,
    #[serde(default = "default_explainability_std_multiplier")]
    pub explainability_std_multiplier: f64,
    /// Cap on the variance penalty term.
    #[serde(default = "default_explainability_variance_cap")]
    pub explainability_variance_cap: f64,
    #[serde(default = "default_opaque_score")]
    pub opaque_score: f64,

    /// Datasets with fewer rows skip drift estimation.
    #[serde(default = "default_drift_min_rows")]
    pub drift_min_rows: usize,
    #[serde(default = "default_drift_small_sample")]
    pub drift_small_sample: f64,
    /// PSI at or above this value scores 1.0.
    #[serde(default = "default_psi_divisor")]
    pub psi_divisor: f64,
    #[serde(default = "default_psi_buckets")]
    pub psi_buckets: usize,
    /// Positive-rate shift treated as maximum drift.
    #[serde(default = "default_decision_shift_divisor")]
    pub decision_shift_divisor: f64,
    #[serde(default = "default_drift_unknown")]
    pub drift_unknown: f64,
}

impl Default for PolicyConstants {
    fn default() -> Self {
        Self {
            bias_gap_divisor: default_bias_gap_divisor(),
            min_group_size: default_min_group_size(),
            bias_std_multiplier: default_bias_std_multiplier(),
            bias_unknown: default_bias_unknown(),
            hallucination_confidence_cutoff: default_hallucination_confidence_cutoff(),
            hallucination_unknown: default_hallucination_unknown(),
            classifier_cap: default_classifier_cap(),
            no_text_score: default_no_text_score(),
            robustness_std_multiplier: default_robustness_std_multiplier(),
            robustness_confidence_cutoff: default_robustness_confidence_cutoff(),
            robustness_unknown: default_robustness_unknown(),
            explanation_coverage: default_explanation_coverage(),
            explanation_min_len: default_explanation_min_len(),
            explained_score: default_explained_score(),
            uncertainty_band_low: default_uncertainty_band_low(),
            uncertainty_band_high: default_uncertainty_band_high(),
            uncertainty_weight: default_uncertainty_weight(),
            explainability_std_multiplier: default_explainability_std_multiplier(),
            explainability_variance_cap: default_explainability_variance_cap(),
            opaque_score: default_opaque_score(),
            drift_min_rows: default_drift_min_rows(),
            drift_small_sample: default_drift_small_sample(),
            psi_divisor: default_psi_divisor(),
            psi_buckets: default_psi_buckets(),
            decision_shift_divisor: default_decision_shift_divisor(),
            drift_unknown: default_drift_unknown(),
        }
    }
}

// EU AI Act fairness guidance: a 0.2 parity gap is significant.
fn default_bias_gap_divisor() -> f64 {
    0.4
}

fn default_min_group_size() -> usize {
    5
}

fn default_bias_std_multiplier() -> f64 {
    2.0
}

fn default_bias_unknown() -> f64 {
    0.3
}

fn default_hallucination_confidence_cutoff() -> f64 {
    0.6
}

fn default_hallucination_unknown() -> f64 {
    0.3
}

fn default_classifier_cap() -> usize {
    200
}

fn default_no_text_score() -> f64 {
    0.1
}

fn default_robustness_std_multiplier() -> f64 {
    3.0
}

fn default_robustness_confidence_cutoff() -> f64 {
    0.55
}

fn default_robustness_unknown() -> f64 {
    0.4
}

fn default_explanation_coverage() -> f64 {
    0.8
}

fn default_explanation_min_len() -> usize {
    5
}

fn default_explained_score() -> f64 {
    0.15
}

fn default_uncertainty_band_low() -> f64 {
    0.45
}

fn default_uncertainty_band_high() -> f64 {
    0.55
}

fn default_uncertainty_weight() -> f64 {
    0.6
}

fn default_explainability_std_multiplier() -> f64 {
    2.0
}

fn default_explainability_variance_cap() -> f64 {
    0.5
}

fn default_opaque_score() -> f64 {
    0.75
}

fn default_drift_min_rows() -> usize {
    20
}

fn default_drift_small_sample() -> f64 {
    0.2
}

// PSI > 0.25 is the conventional "significant shift" threshold.
fn default_psi_divisor() -> f64 {
    0.25
}

fn default_psi_buckets() -> usize {
    10
}

fn default_decision_shift_divisor() -> f64 {
    0.2
}

fn default_drift_unknown() -> f64 {
    0.25
}

/// Which toxicity classifier to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// Regex lexicon only (no external calls).
    #[default]
    Keyword,
    /// Google Perspective API.
    Perspective,
}

/// Toxicity classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub backend: ClassifierBackend,
    /// Upper bound on the whole classifier call (seconds).
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
    /// Perspective `comments:analyze` endpoint.
    #[serde(default = "default_perspective_endpoint")]
    pub perspective_endpoint: String,
    /// Perspective API key. The backend is unavailable without one.
    #[serde(default)]
    pub perspective_api_key: Option<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::default(),
            timeout_secs: default_classifier_timeout(),
            perspective_endpoint: default_perspective_endpoint(),
            perspective_api_key: None,
        }
    }
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_classifier_timeout() -> u64 {
    30
}

fn default_perspective_endpoint() -> String {
    "https://commentanalyzer.googleapis.com/v1alpha1/comments:analyze".to_string()
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `RISKSCOPE_`, `__` for nesting)
/// 2. Workspace-local config (`.riskscope/config.toml`)
/// 3. User config (`~/.config/riskscope/config.toml`)
/// 4. Built-in defaults
pub fn load_config(workspace: Option<&Path>) -> Result<ScoringConfig, ScoringError> {
    let mut figment = Figment::from(Serialized::defaults(ScoringConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "riskscope", "riskscope") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".riskscope").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // RISKSCOPE_POLICY__PSI_DIVISOR, RISKSCOPE_CLASSIFIER__BACKEND, etc.
    figment = figment.merge(Env::prefixed("RISKSCOPE_").split("__"));

    let config: ScoringConfig = figment.extract()?;
    config.policy.validate()?;
    Ok(config)
}

impl PolicyConstants {
    /// Reject values that would break the [0, 1] score contract.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let divisors = [
            ("bias_gap_divisor", self.bias_gap_divisor),
            ("psi_divisor", self.psi_divisor),
            ("decision_shift_divisor", self.decision_shift_divisor),
        ];
        for (name, value) in divisors {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ScoringError::config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.psi_buckets == 0 {
            return Err(ScoringError::config("psi_buckets must be at least 1"));
        }
        if self.uncertainty_band_low >= self.uncertainty_band_high {
            return Err(ScoringError::config(
                "uncertainty_band_low must be below uncertainty_band_high",
            ));
        }
        let constants = [
            ("bias_unknown", self.bias_unknown),
            ("hallucination_unknown", self.hallucination_unknown),
            ("no_text_score", self.no_text_score),
            ("robustness_unknown", self.robustness_unknown),
            ("explained_score", self.explained_score),
            ("opaque_score", self.opaque_score),
            ("drift_small_sample", self.drift_small_sample),
            ("drift_unknown", self.drift_unknown),
        ];
        for (name, value) in constants {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoringError::config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calibration() {
        let policy = PolicyConstants::default();
        assert_eq!(policy.bias_gap_divisor, 0.4);
        assert_eq!(policy.psi_divisor, 0.25);
        assert_eq!(policy.min_group_size, 5);
        assert_eq!(policy.drift_min_rows, 20);
        assert_eq!(policy.classifier_cap, 200);
        assert_eq!(policy.uncertainty_band_low, 0.45);
        assert_eq!(policy.uncertainty_band_high, 0.55);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ScoringConfig = toml_from_str(
            r#"
            [policy]
            psi_divisor = 0.1

            [classifier]
            backend = "perspective"
            "#,
        );
        assert_eq!(config.policy.psi_divisor, 0.1);
        assert_eq!(config.policy.bias_gap_divisor, 0.4);
        assert_eq!(config.classifier.backend, ClassifierBackend::Perspective);
        assert_eq!(config.classifier.timeout_secs, 30);
    }

    #[test]
    fn test_load_config_from_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_dir = dir.path().join(".riskscope");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[policy]\nmin_group_size = 10\n",
        )
        .unwrap();
        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.policy.min_group_size, 10);
    }

    #[test]
    fn test_validate_rejects_zero_divisor() {
        let policy = PolicyConstants {
            psi_divisor: 0.0,
            ..Default::default()
        };
        assert!(matches!(policy.validate(), Err(ScoringError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let policy = PolicyConstants {
            uncertainty_band_low: 0.6,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    fn toml_from_str(s: &str) -> ScoringConfig {
        Figment::from(Serialized::defaults(ScoringConfig::default()))
            .merge(Toml::string(s))
            .extract()
            .unwrap()
    }
}
