//! # Scoring Execution
//!
//! The unit of work an execution backend runs. A [`ScoringJob`] owns one
//! [`ExecutionContext`] (run id, processing date, the model loaded once) and
//! drives the input dataset through a pool of scoring lanes:
//!
//! ```text
//! reader ──bounded channel──▶ lane 0 ─▶ scorer ─▶ part-<run>-00000.csv
//!                        ├──▶ lane 1 ─▶ scorer ─▶ part-<run>-00001.csv
//!                        └──▶ ...
//! ```
//!
//! At most `2 × lanes` batches are in flight. The first failure in any lane
//! or in the reader aborts the whole execution.

pub mod context;
pub mod errors;
pub mod job;

pub use context::ExecutionContext;
pub use errors::JobError;
pub use job::{JobSummary, ScoringJob, ScoringJobSpec};
