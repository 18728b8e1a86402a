use super::errors::OrchestrationError;
use super::polling::{PollOutcome, PollingPolicy};
use super::report::RunReport;
use crate::backend::{ExecutionBackend, ExecutionId, JobDefinition, JobRegistry};
use crate::config::ChurnConfig;
use crate::logging::{log_error, log_job_operation};
use crate::state_machine::{JobEvent, JobRunState, JobStateMachine};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives one job through ensure → submit → poll.
///
/// Every backend call is awaited exactly once; transport errors end the run
/// immediately and nothing is retried.
pub struct JobOrchestrator {
    registry: Arc<dyn JobRegistry>,
    backend: Arc<dyn ExecutionBackend>,
    definition: JobDefinition,
    policy: PollingPolicy,
}

impl JobOrchestrator {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        backend: Arc<dyn ExecutionBackend>,
        definition: JobDefinition,
        policy: PollingPolicy,
    ) -> Self {
        Self {
            registry,
            backend,
            definition,
            policy,
        }
    }

    pub fn from_config(
        registry: Arc<dyn JobRegistry>,
        backend: Arc<dyn ExecutionBackend>,
        config: &ChurnConfig,
    ) -> Self {
        Self::new(
            registry,
            backend,
            JobDefinition::from_config(config),
            PollingPolicy::from_config(&config.polling),
        )
    }

    pub fn with_policy(mut self, policy: PollingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn definition(&self) -> &JobDefinition {
        &self.definition
    }

    pub fn policy(&self) -> &PollingPolicy {
        &self.policy
    }

    pub fn job_name(&self) -> &str {
        &self.definition.name
    }

    /// Create the job definition, treating an existing one as success.
    ///
    /// Returns whether the definition was created by this call.
    pub async fn ensure_job_definition(&self) -> Result<bool, OrchestrationError> {
        match self.registry.create_job_definition(&self.definition).await {
            Ok(()) => {
                log_job_operation("create_definition", self.job_name(), None, "CREATED", None);
                Ok(true)
            }
            Err(e) if e.is_already_exists() => {
                info!(
                    job_name = %self.job_name(),
                    "Job definition already exists, proceeding to run"
                );
                Ok(false)
            }
            Err(source) => {
                log_error("orchestrator", "create_definition", &source.to_string(), Some(self.job_name()));
                Err(OrchestrationError::Definition {
                    job_name: self.job_name().to_string(),
                    source,
                })
            }
        }
    }

    /// Start a new execution; does not wait for it
    pub async fn submit(&self) -> Result<ExecutionId, OrchestrationError> {
        let execution_id = self
            .backend
            .start_execution(self.job_name())
            .await
            .map_err(|source| {
                log_error("orchestrator", "submit", &source.to_string(), Some(self.job_name()));
                OrchestrationError::Submission {
                    job_name: self.job_name().to_string(),
                    source,
                }
            })?;

        log_job_operation(
            "submit",
            self.job_name(),
            Some(execution_id.as_str()),
            JobRunState::Submitted.as_str(),
            None,
        );
        Ok(execution_id)
    }

    /// Poll an already submitted execution until it is terminal or the
    /// policy's `max_wait` elapses
    pub async fn poll(&self, execution_id: &ExecutionId) -> Result<PollOutcome, OrchestrationError> {
        let mut machine = JobStateMachine::new(self.job_name());
        machine.transition(JobEvent::Submit)?;
        self.poll_with(&mut machine, execution_id).await
    }

    /// ensure → submit → poll
    pub async fn run(&self) -> Result<RunReport, OrchestrationError> {
        let started = Instant::now();
        let mut machine = JobStateMachine::new(self.job_name());

        let definition_created = self.ensure_job_definition().await?;
        let execution_id = self.submit().await?;
        machine.transition(JobEvent::Submit)?;

        let outcome = self.poll_with(&mut machine, &execution_id).await?;

        Ok(RunReport {
            job_name: self.job_name().to_string(),
            execution_id,
            definition_created,
            outcome,
            elapsed: started.elapsed(),
            transitions: machine.history().to_vec(),
        })
    }

    async fn poll_with(
        &self,
        machine: &mut JobStateMachine,
        execution_id: &ExecutionId,
    ) -> Result<PollOutcome, OrchestrationError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let status = self
                .backend
                .get_execution_state(self.job_name(), execution_id)
                .await
                .map_err(|source| {
                    log_error("orchestrator", "poll", &source.to_string(), Some(execution_id.as_str()));
                    OrchestrationError::Poll {
                        job_name: self.job_name().to_string(),
                        execution_id: execution_id.clone(),
                        source,
                    }
                })?;
            attempts += 1;

            machine.observe(status.state, status.error_message.as_deref())?;

            if status.state.is_terminal() {
                log_job_operation(
                    "poll",
                    self.job_name(),
                    Some(execution_id.as_str()),
                    status.state.as_str(),
                    status.error_message.as_deref(),
                );
                return Ok(PollOutcome::Completed {
                    state: status.state,
                    error_message: status.error_message,
                    attempts,
                    waited: started.elapsed(),
                });
            }

            let waited = started.elapsed();
            let mut interval = self.policy.interval_for_attempt(attempts);
            if let Some(max_wait) = self.policy.max_wait {
                if waited >= max_wait {
                    warn!(
                        job_name = %self.job_name(),
                        execution_id = %execution_id,
                        last_state = %status.state,
                        attempts,
                        waited_secs = waited.as_secs_f64(),
                        "⏰ Gave up polling before the execution finished"
                    );
                    return Ok(PollOutcome::TimedOut {
                        last_state: status.state,
                        attempts,
                        waited,
                    });
                }
                interval = interval.min(max_wait - waited);
            }

            debug!(
                job_name = %self.job_name(),
                execution_id = %execution_id,
                state = %status.state,
                attempt = attempts,
                next_poll_ms = interval.as_millis() as u64,
                "Status: {}...",
                status.state
            );
            tokio::time::sleep(interval).await;
        }
    }
}
