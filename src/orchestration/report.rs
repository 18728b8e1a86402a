use super::polling::PollOutcome;
use crate::backend::ExecutionId;
use crate::state_machine::{JobRunState, TransitionRecord};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Result of one ensure → submit → poll run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub job_name: String,
    pub execution_id: ExecutionId,
    /// Whether this run created the job definition
    pub definition_created: bool,
    pub outcome: PollOutcome,
    pub elapsed: Duration,
    pub transitions: Vec<TransitionRecord>,
}

impl RunReport {
    pub fn attempts(&self) -> u32 {
        self.outcome.attempts()
    }

    /// Terminal backend state, `None` when polling gave up first
    pub fn final_state(&self) -> Option<JobRunState> {
        self.outcome.terminal_state()
    }

    pub fn reached_terminal_state(&self) -> bool {
        self.final_state().is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.final_state() == Some(JobRunState::Succeeded)
    }

    /// Process exit code for the driver: 0 whenever a terminal state was reached
    pub fn exit_code(&self) -> i32 {
        if self.reached_terminal_state() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PollOutcome::Completed {
                state,
                error_message,
                attempts,
                ..
            } => {
                write!(
                    f,
                    "Job '{}' run {} finished with status: {} after {} polls in {:.1?}",
                    self.job_name, self.execution_id, state, attempts, self.elapsed
                )?;
                match (error_message.as_deref(), state) {
                    (Some(message), state) if state.is_failure() => {
                        write!(f, "\nError: {message}")?;
                    }
                    (None, JobRunState::Failed) => f.write_str("\nError: <no error message>")?,
                    _ => {}
                }
                Ok(())
            }
            PollOutcome::TimedOut {
                last_state,
                attempts,
                waited,
            } => write!(
                f,
                "Job '{}' run {} still {} after waiting {:.1?} ({} polls); gave up polling",
                self.job_name, self.execution_id, last_state, waited, attempts
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: PollOutcome) -> RunReport {
        RunReport {
            job_name: "churn".to_string(),
            execution_id: ExecutionId::new("jr_1"),
            definition_created: false,
            outcome,
            elapsed: Duration::from_secs(90),
            transitions: Vec::new(),
        }
    }

    #[test]
    fn test_failed_report_carries_message_verbatim() {
        let report = report(PollOutcome::Completed {
            state: JobRunState::Failed,
            error_message: Some("FeatureMismatch: batch is missing required feature columns [Contract]".to_string()),
            attempts: 3,
            waited: Duration::from_secs(60),
        });
        let text = report.to_string();
        assert!(text.contains("finished with status: FAILED"));
        assert!(text.ends_with(
            "\nError: FeatureMismatch: batch is missing required feature columns [Contract]"
        ));
        assert_eq!(report.exit_code(), 0);
        assert!(!report.succeeded());
    }

    #[test]
    fn test_timeout_state_report_carries_message() {
        let report = report(PollOutcome::Completed {
            state: JobRunState::TimedOut,
            error_message: Some("Execution exceeded the job timeout of 60m".to_string()),
            attempts: 4,
            waited: Duration::from_secs(1),
        });
        let text = report.to_string();
        assert!(text.contains("finished with status: TIMEOUT"));
        assert!(text.ends_with("\nError: Execution exceeded the job timeout of 60m"));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_stopped_report_without_message_has_no_error_line() {
        let report = report(PollOutcome::Completed {
            state: JobRunState::Stopped,
            error_message: None,
            attempts: 1,
            waited: Duration::ZERO,
        });
        assert!(!report.to_string().contains("Error:"));
    }

    #[test]
    fn test_timed_out_report_is_nonzero_exit() {
        let report = report(PollOutcome::TimedOut {
            last_state: JobRunState::Running,
            attempts: 7,
            waited: Duration::from_secs(5400),
        });
        assert!(report.to_string().contains("still RUNNING"));
        assert_eq!(report.final_state(), None);
        assert_eq!(report.exit_code(), 1);
    }
}
