use super::states::JobRunState;
use serde::{Deserialize, Serialize};

/// Events that move a job execution through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum JobEvent {
    /// The backend accepted a new execution
    Submit,
    /// The backend started running the execution
    Start,
    /// The execution finished successfully
    Succeed,
    /// The execution failed with the backend's error message
    Fail(Option<String>),
    /// The execution was stopped at the backend
    Stop,
    /// The execution exceeded its timeout
    TimeOut,
}

impl JobEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Start => "start",
            Self::Succeed => "succeed",
            Self::Fail(_) => "fail",
            Self::Stop => "stop",
            Self::TimeOut => "time_out",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => msg.as_deref(),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeed | Self::Fail(_) | Self::Stop | Self::TimeOut
        )
    }

    /// The event implied by a state reported by the backend
    pub fn for_observed_state(state: JobRunState, error_message: Option<&str>) -> Option<Self> {
        match state {
            JobRunState::NotSubmitted => None,
            JobRunState::Submitted => Some(Self::Submit),
            JobRunState::Running => Some(Self::Start),
            JobRunState::Succeeded => Some(Self::Succeed),
            JobRunState::Failed => Some(Self::Fail(error_message.map(str::to_string))),
            JobRunState::Stopped => Some(Self::Stop),
            JobRunState::TimedOut => Some(Self::TimeOut),
        }
    }
}
