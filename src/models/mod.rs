//! # Data Model
//!
//! Records and batches exchanged between the object store, the partition
//! scorer and the output writer.
//!
//! - [`record`] - raw input rows grouped into header-sharing [`RowBatch`]es
//! - [`features`] - the classifier's view of a cleaned batch
//! - [`scored`] - scored output rows and batches

pub mod features;
pub mod record;
pub mod scored;

pub use features::{FeatureMatrix, FeatureValue};
pub use record::{BatchSchema, DataModelError, InputRecord, RowBatch};
pub use scored::{ScoredBatch, ScoredRecord};
