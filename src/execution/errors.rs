use crate::artifact::ArtifactError;
use crate::scoring::ScoringError;
use crate::storage::StorageError;
use crate::writer::WriterError;
use thiserror::Error;

/// Fatal failure of a scoring execution.
///
/// The display text is what the backend reports as the execution's error
/// message, so the underlying error is shown unwrapped.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("{0}")]
    Artifact(#[from] ArtifactError),

    #[error("{0}")]
    Scoring(#[from] ScoringError),

    #[error("{0}")]
    Writer(#[from] WriterError),

    #[error("{0}")]
    Storage(#[from] StorageError),

    #[error("Invalid job argument {key}: {reason}")]
    InvalidArgument { key: String, reason: String },

    #[error("Execution stopped before completion")]
    Stopped,

    #[error("Scoring lane {lane} panicked")]
    LanePanicked { lane: usize },
}

impl JobError {
    pub fn invalid_argument(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
