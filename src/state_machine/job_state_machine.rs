use super::{
    errors::{StateMachineError, StateMachineResult},
    events::JobEvent,
    states::JobRunState,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// One applied transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionRecord {
    pub from: JobRunState,
    pub to: JobRunState,
    pub event: String,
    pub at: DateTime<Utc>,
}

/// In-memory state machine for one job execution
#[derive(Debug, Clone)]
pub struct JobStateMachine {
    job_name: String,
    current: JobRunState,
    error_message: Option<String>,
    history: Vec<TransitionRecord>,
}

impl JobStateMachine {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            current: JobRunState::default(),
            error_message: None,
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> JobRunState {
        self.current
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Apply an event, returning the new state
    pub fn transition(&mut self, event: JobEvent) -> StateMachineResult<JobRunState> {
        let from = self.current;
        let to = Self::determine_target_state(from, &event)?;

        if let Some(message) = event.error_message() {
            self.error_message = Some(message.to_string());
        }

        debug!(
            job_name = %self.job_name,
            from = %from,
            to = %to,
            event = event.event_type(),
            "Job state transition"
        );

        self.history.push(TransitionRecord {
            from,
            to,
            event: event.event_type().to_string(),
            at: Utc::now(),
        });
        self.current = to;
        Ok(to)
    }

    /// Apply a state reported by the backend.
    ///
    /// Re-reporting the current state is not a transition; returns whether the
    /// state changed.
    pub fn observe(
        &mut self,
        state: JobRunState,
        error_message: Option<&str>,
    ) -> StateMachineResult<bool> {
        if state == self.current {
            return Ok(false);
        }

        let event = JobEvent::for_observed_state(state, error_message).ok_or_else(|| {
            StateMachineError::InvalidTransition {
                from: self.current.to_string(),
                event: format!("observed {state}"),
            }
        })?;

        self.transition(event)?;
        Ok(true)
    }

    /// Determine the target state based on current state and event
    fn determine_target_state(
        current: JobRunState,
        event: &JobEvent,
    ) -> StateMachineResult<JobRunState> {
        if current.is_terminal() {
            return Err(StateMachineError::AlreadyTerminal {
                state: current.to_string(),
            });
        }

        let target = match (current, event) {
            (JobRunState::NotSubmitted, JobEvent::Submit) => JobRunState::Submitted,
            (JobRunState::Submitted, JobEvent::Start) => JobRunState::Running,

            // A short execution may finish between two polls, so terminal
            // events are accepted straight from SUBMITTED
            (JobRunState::Submitted | JobRunState::Running, JobEvent::Succeed) => {
                JobRunState::Succeeded
            }
            (JobRunState::Submitted | JobRunState::Running, JobEvent::Fail(_)) => {
                JobRunState::Failed
            }
            (JobRunState::Submitted | JobRunState::Running, JobEvent::Stop) => {
                JobRunState::Stopped
            }
            (JobRunState::Submitted | JobRunState::Running, JobEvent::TimeOut) => {
                JobRunState::TimedOut
            }

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: from_state.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };

        Ok(target)
    }
}
