//! # Job Registry and Execution Backend
//!
//! The remote side of an orchestrated run. [`JobRegistry`] stores job
//! definitions, [`ExecutionBackend`] starts executions and reports their
//! state. Both are async traits so a managed service client and the
//! in-process [`LocalExecutionBackend`] are interchangeable.

pub mod errors;
pub mod local;

pub use errors::BackendError;
pub use local::LocalExecutionBackend;

use crate::config::ChurnConfig;
use crate::constants::{job, job_arguments};
use crate::state_machine::JobRunState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Backend-assigned identifier of one execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `jr_` followed by 32 hex digits
    pub fn generate() -> Self {
        Self(format!("jr_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Settings of a registered job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub role: String,
    /// `<bucket>/<key>` of the job script
    pub script_location: String,
    pub temp_dir: String,
    /// Arguments every execution receives, keyed by `--flag`
    pub default_arguments: BTreeMap<String, String>,
    pub worker_type: String,
    pub worker_count: u32,
    pub timeout: Duration,
}

impl JobDefinition {
    /// Build the definition and the scoring job's arguments from configuration
    pub fn from_config(config: &ChurnConfig) -> Self {
        let scoring = &config.scoring;
        let temp_dir = config.job.temp_dir();

        let default_arguments = BTreeMap::from([
            (job_arguments::JOB_LANGUAGE.to_string(), job::SCRIPT_LANGUAGE.to_string()),
            (job_arguments::TEMP_DIR.to_string(), temp_dir.clone()),
            (
                job_arguments::ADDITIONAL_MODULES.to_string(),
                config.job.additional_modules.join(","),
            ),
            (job_arguments::BUCKET.to_string(), scoring.bucket.clone()),
            (job_arguments::MODEL_KEY.to_string(), scoring.model_key.clone()),
            (job_arguments::INPUT_PATH.to_string(), scoring.input_path.clone()),
            (job_arguments::OUTPUT_PATH.to_string(), scoring.output_path.clone()),
            (job_arguments::BATCH_SIZE.to_string(), scoring.batch_size.to_string()),
            (job_arguments::THRESHOLD.to_string(), scoring.threshold.to_string()),
            (
                job_arguments::WRITE_HEADER.to_string(),
                scoring.write_header.to_string(),
            ),
        ]);

        Self {
            name: config.job.name.clone(),
            role: config.job.role.clone(),
            script_location: config.job.script_location(),
            temp_dir,
            default_arguments,
            worker_type: config.job.worker_type.clone(),
            worker_count: config.job.worker_count,
            timeout: config.job.timeout(),
        }
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.default_arguments.get(key).map(String::as_str)
    }

    /// Structural checks a registry applies before accepting a definition
    pub fn validate(&self) -> Result<(), BackendError> {
        let invalid = |reason: &str| BackendError::InvalidDefinition {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("job name is empty"));
        }
        if self.script_location.trim().is_empty() {
            return Err(invalid("script location is empty"));
        }
        if self.worker_count == 0 {
            return Err(invalid("worker count must be greater than 0"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout must be greater than 0"));
        }
        match self.argument(job_arguments::ADDITIONAL_MODULES) {
            Some(modules) if !modules.trim().is_empty() => Ok(()),
            _ => Err(invalid("default arguments must list --additional-modules")),
        }
    }
}

/// State of one execution as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub state: JobRunState,
    /// Present on `FAILED` (and on `TIMEOUT` when the backend explains it)
    pub error_message: Option<String>,
}

impl ExecutionStatus {
    pub fn new(state: JobRunState) -> Self {
        Self {
            state,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: JobRunState::Failed,
            error_message: Some(message.into()),
        }
    }
}

/// Stores job definitions
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// Register a definition; [`BackendError::AlreadyExists`] when the name is taken
    async fn create_job_definition(&self, definition: &JobDefinition) -> Result<(), BackendError>;
}

/// Runs executions of registered jobs
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Start a new execution; returns as soon as it is accepted
    async fn start_execution(&self, job_name: &str) -> Result<ExecutionId, BackendError>;

    /// Current state of an execution
    async fn get_execution_state(
        &self,
        job_name: &str,
        execution_id: &ExecutionId,
    ) -> Result<ExecutionStatus, BackendError>;
}
