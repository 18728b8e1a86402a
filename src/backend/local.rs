//! In-process job registry and execution backend.
//!
//! Executions run the [`ScoringJob`] on tokio's blocking pool under the job
//! definition's timeout and move through `SUBMITTED → RUNNING → terminal`
//! exactly like a managed backend reports them.

use super::{
    BackendError, ExecutionBackend, ExecutionId, ExecutionStatus, JobDefinition, JobRegistry,
};
use crate::execution::{JobSummary, ScoringJob, ScoringJobSpec};
use crate::state_machine::JobRunState;
use crate::storage::ObjectStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
struct ExecutionRecord {
    job_name: String,
    status: ExecutionStatus,
    started_on: DateTime<Utc>,
    completed_on: Option<DateTime<Utc>>,
    summary: Option<JobSummary>,
    stop: Option<Arc<AtomicBool>>,
}

/// Registry and backend backed by in-memory maps; data lives in the object store
#[derive(Debug, Clone)]
pub struct LocalExecutionBackend {
    store: Arc<dyn ObjectStore>,
    definitions: Arc<DashMap<String, JobDefinition>>,
    executions: Arc<DashMap<ExecutionId, ExecutionRecord>>,
    start_delay: Duration,
    processing_date: Option<NaiveDate>,
}

impl LocalExecutionBackend {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            definitions: Arc::new(DashMap::new()),
            executions: Arc::new(DashMap::new()),
            start_delay: Duration::ZERO,
            processing_date: None,
        }
    }

    /// Keep new executions in `SUBMITTED` for a while before they start
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Run every execution as if on the given date
    pub fn with_processing_date(mut self, processing_date: NaiveDate) -> Self {
        self.processing_date = Some(processing_date);
        self
    }

    pub fn definition(&self, job_name: &str) -> Option<JobDefinition> {
        self.definitions.get(job_name).map(|d| d.clone())
    }

    /// Executions of a job, oldest first
    pub fn executions(&self, job_name: &str) -> Vec<ExecutionId> {
        let mut runs: Vec<(DateTime<Utc>, ExecutionId)> = self
            .executions
            .iter()
            .filter(|entry| entry.job_name == job_name)
            .map(|entry| (entry.started_on, entry.key().clone()))
            .collect();
        runs.sort();
        runs.into_iter().map(|(_, id)| id).collect()
    }

    /// Summary of a successful execution
    pub fn execution_summary(&self, execution_id: &ExecutionId) -> Option<JobSummary> {
        self.executions
            .get(execution_id)
            .and_then(|record| record.summary.clone())
    }

    pub fn completed_on(&self, execution_id: &ExecutionId) -> Option<DateTime<Utc>> {
        self.executions
            .get(execution_id)
            .and_then(|record| record.completed_on)
    }

    /// Mark an execution `STOPPED`. Scoring lanes halt after their current
    /// batch; the execution is not awaited. Stopping a finished execution
    /// returns its terminal status unchanged.
    pub fn stop_execution(
        &self,
        job_name: &str,
        execution_id: &ExecutionId,
    ) -> Result<ExecutionStatus, BackendError> {
        let mut record = self
            .executions
            .get_mut(execution_id)
            .filter(|record| record.job_name == job_name)
            .ok_or_else(|| BackendError::ExecutionNotFound {
                job_name: job_name.to_string(),
                execution_id: execution_id.to_string(),
            })?;

        if record.status.state.is_terminal() {
            return Ok(record.status.clone());
        }

        if let Some(stop) = &record.stop {
            stop.store(true, Ordering::SeqCst);
        }
        record.status = ExecutionStatus::new(JobRunState::Stopped);
        record.completed_on = Some(Utc::now());

        info!(job_name, execution_id = %execution_id, "⏹️ LOCAL BACKEND: Execution stopped");
        Ok(record.status.clone())
    }

    /// Apply a status unless the execution already reached a terminal state
    fn update(
        executions: &DashMap<ExecutionId, ExecutionRecord>,
        execution_id: &ExecutionId,
        status: ExecutionStatus,
        summary: Option<JobSummary>,
    ) -> bool {
        let Some(mut record) = executions.get_mut(execution_id) else {
            return false;
        };
        if record.status.state.is_terminal() {
            return false;
        }

        debug!(
            execution_id = %execution_id,
            from = %record.status.state,
            to = %status.state,
            "Local execution state change"
        );
        if status.state.is_terminal() {
            record.completed_on = Some(Utc::now());
        }
        record.status = status;
        record.summary = summary;
        true
    }

    async fn drive(
        executions: Arc<DashMap<ExecutionId, ExecutionRecord>>,
        execution_id: ExecutionId,
        job: Result<ScoringJob, String>,
        timeout: Duration,
        start_delay: Duration,
    ) {
        if !start_delay.is_zero() {
            tokio::time::sleep(start_delay).await;
        }

        if !Self::update(
            &executions,
            &execution_id,
            ExecutionStatus::new(JobRunState::Running),
            None,
        ) {
            return;
        }

        let job = match job {
            Ok(job) => job,
            Err(message) => {
                error!(execution_id = %execution_id, error = %message, "Execution rejected its arguments");
                Self::update(&executions, &execution_id, ExecutionStatus::failed(message), None);
                return;
            }
        };

        let stop = job.stop_handle();
        let outcome = tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || job.run())).await;

        let (status, summary) = match outcome {
            Ok(Ok(Ok(summary))) => (ExecutionStatus::new(JobRunState::Succeeded), Some(summary)),
            Ok(Ok(Err(e))) => (ExecutionStatus::failed(e.to_string()), None),
            Ok(Err(join_error)) => (
                ExecutionStatus::failed(format!("Execution aborted: {join_error}")),
                None,
            ),
            Err(_) => {
                stop.store(true, Ordering::SeqCst);
                warn!(execution_id = %execution_id, timeout_secs = timeout.as_secs_f64(), "Execution timed out");
                (
                    ExecutionStatus {
                        state: JobRunState::TimedOut,
                        error_message: Some(format!(
                            "Execution exceeded the job timeout of {:?}",
                            timeout
                        )),
                    },
                    None,
                )
            }
        };

        let state = status.state;
        if Self::update(&executions, &execution_id, status, summary) {
            info!(execution_id = %execution_id, state = %state, "🏁 LOCAL BACKEND: Execution finished");
        }
    }
}

#[async_trait]
impl JobRegistry for LocalExecutionBackend {
    async fn create_job_definition(&self, definition: &JobDefinition) -> Result<(), BackendError> {
        definition.validate()?;

        match self.definitions.entry(definition.name.clone()) {
            Entry::Occupied(_) => Err(BackendError::AlreadyExists {
                name: definition.name.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(definition.clone());
                info!(
                    job_name = %definition.name,
                    script_location = %definition.script_location,
                    worker_type = %definition.worker_type,
                    worker_count = definition.worker_count,
                    "📝 LOCAL BACKEND: Job definition created"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ExecutionBackend for LocalExecutionBackend {
    async fn start_execution(&self, job_name: &str) -> Result<ExecutionId, BackendError> {
        let definition = self
            .definition(job_name)
            .ok_or_else(|| BackendError::JobNotFound {
                name: job_name.to_string(),
            })?;

        let job = ScoringJobSpec::from_definition(&definition)
            .map(|spec| {
                let job = ScoringJob::new(Arc::clone(&self.store), spec);
                match self.processing_date {
                    Some(date) => job.with_processing_date(date),
                    None => job,
                }
            })
            .map_err(|e| e.to_string());

        let execution_id = ExecutionId::generate();
        self.executions.insert(
            execution_id.clone(),
            ExecutionRecord {
                job_name: job_name.to_string(),
                status: ExecutionStatus::new(JobRunState::Submitted),
                started_on: Utc::now(),
                completed_on: None,
                summary: None,
                stop: job.as_ref().ok().map(ScoringJob::stop_handle),
            },
        );

        info!(job_name, execution_id = %execution_id, "▶️ LOCAL BACKEND: Execution submitted");

        tokio::spawn(Self::drive(
            Arc::clone(&self.executions),
            execution_id.clone(),
            job,
            definition.timeout,
            self.start_delay,
        ));

        Ok(execution_id)
    }

    async fn get_execution_state(
        &self,
        job_name: &str,
        execution_id: &ExecutionId,
    ) -> Result<ExecutionStatus, BackendError> {
        self.executions
            .get(execution_id)
            .filter(|record| record.job_name == job_name)
            .map(|record| record.status.clone())
            .ok_or_else(|| BackendError::ExecutionNotFound {
                job_name: job_name.to_string(),
                execution_id: execution_id.to_string(),
            })
    }
}
