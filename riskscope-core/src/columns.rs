//! Canonical field resolution.
//!
//! Clients name their columns however they like. Each canonical field carries
//! an ordered alias list; the first alias that matches a column name
//! (case-insensitively) wins.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A semantic field the metrics know how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Decision,
    Confidence,
    GroundTruth,
    TextOutput,
    Gender,
    Race,
    Age,
    Prompt,
    Explanation,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 9] = [
        CanonicalField::Decision,
        CanonicalField::Confidence,
        CanonicalField::GroundTruth,
        CanonicalField::TextOutput,
        CanonicalField::Gender,
        CanonicalField::Race,
        CanonicalField::Age,
        CanonicalField::Prompt,
        CanonicalField::Explanation,
    ];

    /// Protected-attribute families checked by the bias metric, in order.
    pub const PROTECTED: [CanonicalField; 3] = [
        CanonicalField::Gender,
        CanonicalField::Race,
        CanonicalField::Age,
    ];

    /// Candidate column names, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Decision => &["decision", "prediction", "model_decision", "output", "label"],
            Self::Confidence => &[
                "confidence",
                "score",
                "probability",
                "model_confidence",
                "prob",
            ],
            Self::GroundTruth => &["ground_truth", "true_label", "actual", "expected", "correct"],
            Self::TextOutput => &[
                "response",
                "output_text",
                "generated_text",
                "answer",
                "text",
                "model_response",
            ],
            Self::Gender => &["gender", "sex", "user_gender"],
            Self::Race => &["race", "ethnicity", "user_race", "race_ethnicity"],
            Self::Age => &["age", "user_age", "age_group"],
            Self::Prompt => &["prompt", "input", "query", "question"],
            Self::Explanation => &[
                "explanation",
                "reasoning",
                "reason",
                "shap_value",
                "feature_importance",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Confidence => "confidence",
            Self::GroundTruth => "ground_truth",
            Self::TextOutput => "text_output",
            Self::Gender => "gender",
            Self::Race => "race",
            Self::Age => "age",
            Self::Prompt => "prompt",
            Self::Explanation => "explanation",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercased lookup over one dataset's column set.
///
/// When two columns differ only by case, the first one declared wins.
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    lower: HashMap<String, String>,
}

impl ColumnResolver {
    pub fn new(columns: &[String]) -> Self {
        let mut lower = HashMap::new();
        for col in columns {
            lower.entry(col.to_lowercase()).or_insert_with(|| col.clone());
        }
        Self { lower }
    }

    /// Resolve a canonical field to the dataset's column name.
    pub fn resolve(&self, field: CanonicalField) -> Option<&str> {
        self.resolve_aliases(field.aliases())
    }

    /// Resolve an arbitrary ordered alias list.
    pub fn resolve_aliases(&self, candidates: &[&str]) -> Option<&str> {
        candidates
            .iter()
            .find_map(|c| self.lower.get(&c.to_lowercase()))
            .map(String::as_str)
    }

    /// Which column (if any) backs each canonical field.
    pub fn coverage(&self) -> BTreeMap<CanonicalField, Option<String>> {
        CanonicalField::ALL
            .iter()
            .map(|f| (*f, self.resolve(*f).map(str::to_string)))
            .collect()
    }
}
