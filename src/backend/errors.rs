//! # Backend Error Types

use thiserror::Error;

/// Errors reported by the job registry or the execution backend.
///
/// Only [`BackendError::AlreadyExists`] is expected during normal operation;
/// every other variant aborts an orchestrated run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Job definition '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("Job definition '{name}' is invalid: {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("Job definition '{name}' not found")]
    JobNotFound { name: String },

    #[error("Execution '{execution_id}' of job '{job_name}' not found")]
    ExecutionNotFound {
        job_name: String,
        execution_id: String,
    },

    #[error("Transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Malformed backend response to {operation}: {message}")]
    MalformedResponse { operation: String, message: String },
}

impl BackendError {
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn malformed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
