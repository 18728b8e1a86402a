use serde::{Deserialize, Serialize};

/// One cell of the classifier input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FeatureValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Feature columns of the surviving records of one batch, identifier excluded.
///
/// Row `i` corresponds to key `i` of the scorer's aligned key list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_capacity(columns: Vec<String>, rows: usize) -> Self {
        Self {
            columns,
            rows: Vec::with_capacity(rows),
        }
    }

    /// Append a row; the caller keeps it aligned with [`Self::columns`]
    pub fn push_row(&mut self, row: Vec<FeatureValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&FeatureValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
