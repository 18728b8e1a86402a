use serde::{Deserialize, Serialize};

/// One scored customer, in output column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub userid: String,
    pub prediction_proba: f64,
    pub prediction: i32,
}

impl ScoredRecord {
    /// Derive the binary decision from a probability and threshold
    pub fn from_probability(userid: impl Into<String>, probability: f64, threshold: f64) -> Self {
        Self {
            userid: userid.into(),
            prediction_proba: probability,
            prediction: i32::from(probability >= threshold),
        }
    }
}

/// Scored output of one row batch, order preserved from the input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoredBatch {
    records: Vec<ScoredRecord>,
}

impl ScoredBatch {
    pub fn new(records: Vec<ScoredRecord>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ScoredRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ScoredRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records predicted to churn
    pub fn positive_count(&self) -> usize {
        self.records.iter().filter(|r| r.prediction == 1).count()
    }
}
