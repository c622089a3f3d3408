//! Dataset abstraction consumed by the metric computers.
//!
//! The scoring core never parses files. An ingestion layer hands it something
//! that implements [`Dataset`]; [`DataBatch`] is the in-memory implementation.

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Read-only tabular input: a fixed column set and positional rows.
pub trait Dataset: Send + Sync {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Declared column names, in declaration order.
    fn columns(&self) -> &[String];

    /// Cell value, or `None` when the cell is null or missing.
    fn value(&self, row: usize, column: &str) -> Option<&Value>;

    /// Cell rendered as text. Strings are returned as-is, numbers and
    /// booleans in their display form; null, arrays and objects are absent.
    fn text(&self, row: usize, column: &str) -> Option<String> {
        self.value(row, column).and_then(value_to_text)
    }

    /// Cell parsed as a number. Non-numeric values are dropped.
    fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.value(row, column).and_then(value_to_number)
    }

    /// Trimmed, lowercased text for every row; absent cells become "".
    fn normalized_column(&self, column: &str) -> Vec<String> {
        (0..self.row_count())
            .map(|row| {
                self.text(row, column)
                    .map(|t| normalize(&t))
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Every parseable number in a column, in row order.
    fn numeric_column(&self, column: &str) -> Vec<f64> {
        self.numeric_range(column, 0, self.row_count())
    }

    /// Parseable numbers in rows `start..end`.
    fn numeric_range(&self, column: &str, start: usize, end: usize) -> Vec<f64> {
        (start..end.min(self.row_count()))
            .filter_map(|row| self.number(row, column))
            .collect()
    }
}

/// Trim and lowercase a categorical value.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// A batch of rows held in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl DataBatch {
    /// Build a batch, checking that every row matches the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ScoringError> {
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ScoringError::invalid_dataset(format!(
                "row {i} has {} values, expected {}",
                row.len(),
                columns.len()
            )));
        }
        let index = build_index(&columns);
        Ok(Self {
            columns,
            rows,
            index,
        })
    }

    /// Build a batch from an array of JSON objects.
    ///
    /// The column set is the union of all keys, ordered by first appearance
    /// across records; keys a record lacks become null.
    pub fn from_records(records: &[Value]) -> Result<Self, ScoringError> {
        let mut columns: Vec<String> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let obj = record.as_object().ok_or_else(|| {
                ScoringError::invalid_dataset(format!("record {i} is not a JSON object"))
            })?;
            for key in obj.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(Value::as_object)
            .map(|obj| {
                columns
                    .iter()
                    .map(|c| obj.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rebuild the column index after deserialization.
    pub fn reindex(&mut self) {
        self.index = build_index(&self.columns);
    }
}

fn build_index(columns: &[String]) -> HashMap<String, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.clone(), i))
        .collect()
}

impl Dataset for DataBatch {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = match self.index.get(column) {
            Some(idx) => *idx,
            // Deserialized batches carry no index until reindexed.
            None => self.columns.iter().position(|c| c == column)?,
        };
        self.rows
            .get(row)
            .and_then(|r| r.get(idx))
            .filter(|v| !v.is_null())
    }
}
