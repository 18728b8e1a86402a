use super::errors::StateMachineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobRunState {
    /// Nothing has been submitted yet (orchestrator-local)
    NotSubmitted,
    /// Accepted by the backend, not yet running
    Submitted,
    /// Executing on the backend
    Running,
    /// Completed successfully
    Succeeded,
    /// Completed with an error
    Failed,
    /// Stopped at the backend level
    Stopped,
    /// Exceeded the job definition's timeout
    #[serde(rename = "TIMEOUT")]
    TimedOut,
}

impl JobRunState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Stopped | Self::TimedOut
        )
    }

    /// Check if the execution is queued or running
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitted | Self::Running)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Terminal states that end the run unsuccessfully
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Stopped | Self::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotSubmitted => "NOT_SUBMITTED",
            Self::Submitted => "SUBMITTED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Stopped => "STOPPED",
            Self::TimedOut => "TIMEOUT",
        }
    }
}

impl fmt::Display for JobRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobRunState {
    type Err = StateMachineError;

    /// Accepts the canonical names plus the intermediate states managed
    /// backends commonly report (`STARTING`, `WAITING`, `STOPPING`, `ERROR`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NOT_SUBMITTED" => Ok(Self::NotSubmitted),
            "SUBMITTED" | "STARTING" | "WAITING" => Ok(Self::Submitted),
            "RUNNING" | "STOPPING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" | "ERROR" => Ok(Self::Failed),
            "STOPPED" => Ok(Self::Stopped),
            "TIMEOUT" | "TIMED_OUT" => Ok(Self::TimedOut),
            _ => Err(StateMachineError::UnknownState(s.to_string())),
        }
    }
}

impl Default for JobRunState {
    fn default() -> Self {
        Self::NotSubmitted
    }
}
