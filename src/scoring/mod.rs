//! # Partition Scorer
//!
//! Pure per-batch transform from raw input rows to scored output rows. Each
//! batch is processed independently: no state survives between calls and no
//! batch depends on another, which is what lets an execution fan batches out
//! across any number of lanes.
//!
//! Per batch, in order:
//!
//! 1. coerce `TotalCharges` to a number (failures become missing)
//! 2. impute missing `TotalCharges` with the batch-local mean
//! 3. drop every record with `tenure == 0`
//! 4. query the artifact with the surviving feature rows
//! 5. apply the probability threshold

pub mod cleaning;
pub mod errors;
pub mod scorer;

pub use errors::ScoringError;
pub use scorer::{build_features, PartitionScorer};
