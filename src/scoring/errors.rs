//! # Scoring Error Types

use crate::artifact::ArtifactError;
use thiserror::Error;

/// Batch-fatal scoring failures. None of these are recovered in-process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("FeatureMismatch: batch is missing required feature columns [{}]", missing.join(", "))]
    FeatureMismatch { missing: Vec<String> },

    #[error("Malformed value '{value}' in key column '{column}' at row {row}")]
    MalformedRecord {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Missing customer identifier at row {row}")]
    MissingIdentifier { row: usize },

    #[error("Classifier returned {actual} probabilities for {expected} records")]
    PredictionCountMismatch { expected: usize, actual: usize },

    #[error("Classifier error: {0}")]
    Classifier(#[from] ArtifactError),
}
