#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Churn Scoring
//!
//! Batch churn-probability scoring over partitioned tabular data, run as a
//! managed job and published as date-partitioned, append-only results.
//!
//! ## Architecture
//!
//! Two halves meet at the execution backend:
//!
//! - the **job orchestrator** registers the job, starts an execution and
//!   polls it to a terminal state, and
//! - the **scoring execution** loads the model once, streams the input
//!   dataset batch by batch through the partition scorer on a pool of lanes,
//!   and appends every scored batch to today's output partition.
//!
//! ## Module Organization
//!
//! - [`artifact`] - Model loader and the serialized pipeline format
//! - [`scoring`] - Cleaning, filtering and thresholding of one batch
//! - [`schema`] - Output schema contract
//! - [`writer`] - Append-only, date-partitioned output
//! - [`storage`] - Object store abstraction and its filesystem implementation
//! - [`execution`] - The scoring job an execution backend runs
//! - [`backend`] - Job registry and execution backend traits, in-process backend
//! - [`orchestration`] - Ensure, submit and poll with bounded backoff
//! - [`state_machine`] - Job execution lifecycle
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging
//! - [`error`] - Crate-wide error type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use churn_scoring::backend::LocalExecutionBackend;
//! use churn_scoring::config::ConfigManager;
//! use churn_scoring::orchestration::JobOrchestrator;
//! use churn_scoring::storage::LocalObjectStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let store = Arc::new(LocalObjectStore::new(&manager.config().storage.root));
//! let backend = Arc::new(LocalExecutionBackend::new(store));
//!
//! let orchestrator = JobOrchestrator::from_config(backend.clone(), backend, manager.config());
//! let report = orchestrator.run().await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod schema;
pub mod scoring;
pub mod state_machine;
pub mod storage;
pub mod writer;

pub use artifact::{ArtifactError, ArtifactLocation, ModelArtifact, ModelLoader, PipelineArtifact};
pub use backend::{
    BackendError, ExecutionBackend, ExecutionId, ExecutionStatus, JobDefinition, JobRegistry,
    LocalExecutionBackend,
};
pub use config::{ChurnConfig, ConfigManager, ConfigurationError};
pub use error::{ChurnError, Result};
pub use execution::{ExecutionContext, JobError, JobSummary, ScoringJob, ScoringJobSpec};
pub use models::{RowBatch, ScoredBatch, ScoredRecord};
pub use orchestration::{JobOrchestrator, OrchestrationError, PollOutcome, PollingPolicy, RunReport};
pub use schema::{OutputSchema, SchemaViolation};
pub use scoring::{PartitionScorer, ScoringError};
pub use state_machine::{JobEvent, JobRunState, JobStateMachine};
pub use storage::{DatasetLocation, LocalObjectStore, ObjectStore, StorageError};
pub use writer::{OutputPartition, OutputWriter, WriterError};
