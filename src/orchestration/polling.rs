use crate::config::PollingConfig;
use crate::constants::polling;
use crate::state_machine::JobRunState;
use serde::Serialize;
use std::time::Duration;

/// How often, and for how long, the orchestrator queries an execution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollingPolicy {
    pub initial_interval: Duration,
    pub backoff_multiplier: f64,
    pub max_interval: Duration,
    /// `None` polls until the backend reports a terminal state
    pub max_wait: Option<Duration>,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            initial_interval: polling::REFERENCE_INTERVAL,
            backoff_multiplier: polling::DEFAULT_BACKOFF_MULTIPLIER,
            max_interval: polling::DEFAULT_MAX_INTERVAL,
            max_wait: Some(polling::DEFAULT_MAX_WAIT),
        }
    }
}

impl PollingPolicy {
    /// Constant interval, no wait limit
    pub fn fixed(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            backoff_multiplier: 1.0,
            max_interval: interval,
            max_wait: None,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self {
            initial_interval: config.initial_interval(),
            backoff_multiplier: config.backoff_multiplier,
            max_interval: config.max_interval(),
            max_wait: config.max_wait(),
        }
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Sleep after the `attempt`-th query (1-based), capped at `max_interval`
    pub fn interval_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32);
        let secs = self.initial_interval.as_secs_f64() * factor;

        if !secs.is_finite() || secs >= self.max_interval.as_secs_f64() {
            self.max_interval.max(self.initial_interval)
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// How polling ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The backend reported a terminal state
    Completed {
        state: JobRunState,
        /// The backend's message, verbatim, on `FAILED`
        error_message: Option<String>,
        attempts: u32,
        waited: Duration,
    },
    /// `max_wait` elapsed first; the execution may still be running
    TimedOut {
        last_state: JobRunState,
        attempts: u32,
        waited: Duration,
    },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Completed { attempts, .. } | Self::TimedOut { attempts, .. } => *attempts,
        }
    }

    pub fn waited(&self) -> Duration {
        match self {
            Self::Completed { waited, .. } | Self::TimedOut { waited, .. } => *waited,
        }
    }

    /// Terminal backend state, if one was reached
    pub fn terminal_state(&self) -> Option<JobRunState> {
        match self {
            Self::Completed { state, .. } => Some(*state),
            Self::TimedOut { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Completed { error_message, .. } => error_message.as_deref(),
            Self::TimedOut { .. } => None,
        }
    }
}
