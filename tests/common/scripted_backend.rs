//! Scripted job registry and execution backend for orchestrator tests.
//!
//! Every call is recorded; `get_execution_state` replays a queue of scripted
//! responses and keeps repeating the last one once the queue is drained.

use async_trait::async_trait;
use churn_scoring::backend::{
    BackendError, ExecutionBackend, ExecutionId, ExecutionStatus, JobDefinition, JobRegistry,
};
use churn_scoring::state_machine::JobRunState;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ScriptedBackendState {
    pub definitions: HashSet<String>,
    pub create_calls: usize,
    pub start_calls: usize,
    pub poll_calls: usize,
    pub responses: VecDeque<Result<ExecutionStatus, BackendError>>,
    pub last_response: Option<Result<ExecutionStatus, BackendError>>,
    pub create_error: Option<BackendError>,
    pub start_error: Option<BackendError>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptedBackendState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the states `get_execution_state` reports, in order
    pub fn with_states(self, states: &[JobRunState]) -> Self {
        {
            let mut state = self.state.lock();
            state.responses.extend(
                states
                    .iter()
                    .map(|s| Ok(ExecutionStatus::new(*s))),
            );
        }
        self
    }

    pub fn with_status(self, status: ExecutionStatus) -> Self {
        self.state.lock().responses.push_back(Ok(status));
        self
    }

    pub fn with_poll_error(self, error: BackendError) -> Self {
        self.state.lock().responses.push_back(Err(error));
        self
    }

    pub fn with_create_error(self, error: BackendError) -> Self {
        self.state.lock().create_error = Some(error);
        self
    }

    pub fn with_start_error(self, error: BackendError) -> Self {
        self.state.lock().start_error = Some(error);
        self
    }

    /// Pretend the job was registered by an earlier run
    pub fn with_existing_definition(self, name: &str) -> Self {
        self.state.lock().definitions.insert(name.to_string());
        self
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().create_calls
    }

    pub fn start_calls(&self) -> usize {
        self.state.lock().start_calls
    }

    pub fn poll_calls(&self) -> usize {
        self.state.lock().poll_calls
    }

    pub fn definition_count(&self) -> usize {
        self.state.lock().definitions.len()
    }
}

#[async_trait]
impl JobRegistry for ScriptedBackend {
    async fn create_job_definition(&self, definition: &JobDefinition) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.create_calls += 1;

        if let Some(error) = state.create_error.clone() {
            return Err(error);
        }
        if !state.definitions.insert(definition.name.clone()) {
            return Err(BackendError::AlreadyExists {
                name: definition.name.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn start_execution(&self, job_name: &str) -> Result<ExecutionId, BackendError> {
        let mut state = self.state.lock();
        state.start_calls += 1;

        if let Some(error) = state.start_error.clone() {
            return Err(error);
        }
        if !state.definitions.contains(job_name) {
            return Err(BackendError::JobNotFound {
                name: job_name.to_string(),
            });
        }
        Ok(ExecutionId::new(format!("jr_scripted_{}", state.start_calls)))
    }

    async fn get_execution_state(
        &self,
        _job_name: &str,
        _execution_id: &ExecutionId,
    ) -> Result<ExecutionStatus, BackendError> {
        let mut state = self.state.lock();
        state.poll_calls += 1;

        match state.responses.pop_front() {
            Some(response) => {
                state.last_response = Some(response.clone());
                response
            }
            None => state
                .last_response
                .clone()
                .unwrap_or_else(|| Ok(ExecutionStatus::new(JobRunState::Submitted))),
        }
    }
}
