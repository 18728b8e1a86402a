use thiserror::Error;

/// Error types for job state machine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("Invalid state transition from {from} on event '{event}'")]
    InvalidTransition { from: String, event: String },

    #[error("Execution already reached terminal state {state}")]
    AlreadyTerminal { state: String },

    #[error("Unknown execution state: {0}")]
    UnknownState(String),
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
