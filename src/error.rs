//! # Crate Error Taxonomy
//!
//! Each component defines its own error enum; [`ChurnError`] unifies them for
//! callers that drive several components at once.

use crate::artifact::ArtifactError;
use crate::backend::BackendError;
use crate::config::ConfigurationError;
use crate::execution::JobError;
use crate::orchestration::OrchestrationError;
use crate::schema::SchemaViolation;
use crate::scoring::ScoringError;
use crate::state_machine::StateMachineError;
use crate::storage::StorageError;
use crate::writer::WriterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("Execution error: {0}")]
    Execution(#[from] JobError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("State transition error: {0}")]
    StateTransition(#[from] StateMachineError),

    #[error("Orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),
}

pub type Result<T> = std::result::Result<T, ChurnError>;
