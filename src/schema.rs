//! # Output Schema Contract
//!
//! The fixed shape of scored output: `userid` (non-null string),
//! `prediction_proba` (float64 in `[0, 1]`) and `prediction` (int32 in
//! `{0, 1}`, equal to `1` exactly when the probability reaches the threshold).
//! The writer checks every batch against it and refuses to coerce.

use crate::constants::output;
use crate::models::ScoredBatch;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    Utf8,
    Float64,
    Int32,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8 => write!(f, "string"),
            Self::Float64 => write!(f, "double"),
            Self::Int32 => write!(f, "integer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub data_type: DataType,
    pub nullable: bool,
}

/// A batch that breaks the output contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("Field '{field}' is null at row {row} but is declared non-nullable")]
    NullValue { row: usize, field: &'static str },

    #[error("Field '{field}' value {value} at row {row} is outside its allowed range")]
    OutOfRange {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Row {row}: prediction {prediction} disagrees with probability {probability} at threshold {threshold}")]
    ThresholdInconsistent {
        row: usize,
        probability: f64,
        prediction: i32,
        threshold: f64,
    },

    #[error("Row {row}: userid '{userid}' occurs more than once in the batch")]
    DuplicateKey { row: usize, userid: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    fields: Vec<FieldSpec>,
    threshold: f64,
}

impl OutputSchema {
    /// The scored-record contract at a given decision threshold
    pub fn scored_records(threshold: f64) -> Self {
        Self {
            fields: vec![
                FieldSpec {
                    name: output::USERID,
                    data_type: DataType::Utf8,
                    nullable: false,
                },
                FieldSpec {
                    name: output::PREDICTION_PROBA,
                    data_type: DataType::Float64,
                    nullable: false,
                },
                FieldSpec {
                    name: output::PREDICTION,
                    data_type: DataType::Int32,
                    nullable: false,
                },
            ],
            threshold,
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Column names in file order
    pub fn header(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn validate(&self, batch: &ScoredBatch) -> Result<(), SchemaViolation> {
        let mut seen = HashSet::with_capacity(batch.len());

        for (row, record) in batch.records().iter().enumerate() {
            if record.userid.is_empty() {
                return Err(SchemaViolation::NullValue {
                    row,
                    field: output::USERID,
                });
            }

            if !seen.insert(record.userid.as_str()) {
                return Err(SchemaViolation::DuplicateKey {
                    row,
                    userid: record.userid.clone(),
                });
            }

            let p = record.prediction_proba;
            if !(0.0..=1.0).contains(&p) {
                return Err(SchemaViolation::OutOfRange {
                    row,
                    field: output::PREDICTION_PROBA,
                    value: p.to_string(),
                });
            }

            if !matches!(record.prediction, 0 | 1) {
                return Err(SchemaViolation::OutOfRange {
                    row,
                    field: output::PREDICTION,
                    value: record.prediction.to_string(),
                });
            }

            if (record.prediction == 1) != (p >= self.threshold) {
                return Err(SchemaViolation::ThresholdInconsistent {
                    row,
                    probability: p,
                    prediction: record.prediction,
                    threshold: self.threshold,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                format!(
                    "{}: {}{}",
                    field.name,
                    field.data_type,
                    if field.nullable { "" } else { " not null" }
                )
            })
            .collect();
        write!(f, "struct<{}>", fields.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoredRecord;

    fn record(userid: &str, proba: f64, prediction: i32) -> ScoredRecord {
        ScoredRecord {
            userid: userid.to_string(),
            prediction_proba: proba,
            prediction,
        }
    }

    fn schema() -> OutputSchema {
        OutputSchema::scored_records(0.5)
    }

    #[test]
    fn test_valid_batch_passes() {
        let batch = ScoredBatch::new(vec![record("A", 0.7, 1), record("B", 0.5, 1), record("C", 0.1, 0)]);
        assert!(schema().validate(&batch).is_ok());
        assert!(schema().validate(&ScoredBatch::empty()).is_ok());
    }

    #[test]
    fn test_rejects_empty_userid() {
        let batch = ScoredBatch::new(vec![record("", 0.7, 1)]);
        assert_eq!(
            schema().validate(&batch).unwrap_err(),
            SchemaViolation::NullValue {
                row: 0,
                field: "userid"
            }
        );
    }

    #[test]
    fn test_rejects_out_of_range_probability() {
        for p in [1.2, -0.1, f64::NAN] {
            let batch = ScoredBatch::new(vec![record("A", p, 1)]);
            assert!(matches!(
                schema().validate(&batch).unwrap_err(),
                SchemaViolation::OutOfRange { field: "prediction_proba", .. }
            ));
        }
    }

    #[test]
    fn test_rejects_non_binary_prediction() {
        let batch = ScoredBatch::new(vec![record("A", 0.7, 2)]);
        assert!(matches!(
            schema().validate(&batch).unwrap_err(),
            SchemaViolation::OutOfRange { field: "prediction", .. }
        ));
    }

    #[test]
    fn test_rejects_threshold_disagreement() {
        let batch = ScoredBatch::new(vec![record("A", 0.3, 1)]);
        assert!(matches!(
            schema().validate(&batch).unwrap_err(),
            SchemaViolation::ThresholdInconsistent { row: 0, .. }
        ));
    }

    #[test]
    fn test_rejects_duplicate_userid() {
        let batch = ScoredBatch::new(vec![record("A", 0.3, 0), record("A", 0.9, 1)]);
        assert_eq!(
            schema().validate(&batch).unwrap_err(),
            SchemaViolation::DuplicateKey {
                row: 1,
                userid: "A".to_string()
            }
        );
    }

    #[test]
    fn test_display_and_header() {
        assert_eq!(schema().header(), vec!["userid", "prediction_proba", "prediction"]);
        assert_eq!(
            schema().to_string(),
            "struct<userid: string not null, prediction_proba: double not null, prediction: integer not null>"
        );
    }
}
