//! # Orchestration Error Types

use crate::backend::{BackendError, ExecutionId};
use crate::state_machine::StateMachineError;
use thiserror::Error;

/// Failures that end an orchestrated run early.
///
/// A definition conflict is not among them; it is absorbed by
/// `ensure_job_definition`. Nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Failed to create job definition '{job_name}': {source}")]
    Definition {
        job_name: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to start an execution of job '{job_name}': {source}")]
    Submission {
        job_name: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to query execution {execution_id} of job '{job_name}': {source}")]
    Poll {
        job_name: String,
        execution_id: ExecutionId,
        #[source]
        source: BackendError,
    },

    #[error("Backend reported an impossible state change: {0}")]
    InvalidTransition(#[from] StateMachineError),
}

impl OrchestrationError {
    /// The backend error behind this failure, if any
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::Definition { source, .. }
            | Self::Submission { source, .. }
            | Self::Poll { source, .. } => Some(source),
            Self::InvalidTransition(_) => None,
        }
    }
}
