//! # Job Orchestration
//!
//! Registers the scoring job with the backend, starts one execution and polls
//! it to a terminal state:
//!
//! ```text
//! NOT_SUBMITTED ─submit─▶ SUBMITTED ─▶ RUNNING ─▶ SUCCEEDED | FAILED | STOPPED | TIMEOUT
//! ```
//!
//! Polling backs off exponentially up to a cap and gives up after the
//! policy's maximum wait with [`PollOutcome::TimedOut`], leaving the remote
//! execution untouched.

pub mod errors;
pub mod orchestrator;
pub mod polling;
pub mod report;
pub mod staging;

pub use errors::OrchestrationError;
pub use orchestrator::JobOrchestrator;
pub use polling::{PollOutcome, PollingPolicy};
pub use report::RunReport;
pub use staging::stage_job_script;
