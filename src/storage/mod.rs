//! # Object Store
//!
//! Durable storage for model artifacts, the raw input dataset and the scored
//! output. The [`ObjectStore`] trait is the seam to the storage substrate;
//! [`LocalObjectStore`] maps buckets onto directories of a local root.
//!
//! Datasets are read lazily as a sequence of [`RowBatch`]es so the full input
//! never has to fit in memory.

pub mod errors;
pub mod local;

pub use errors::StorageError;
pub use local::LocalObjectStore;

use crate::models::RowBatch;
use std::fmt;
use std::io::Write;

/// Lazy, fallible sequence of input batches
pub type RowBatchStream = Box<dyn Iterator<Item = Result<RowBatch, StorageError>> + Send>;

/// A `bucket` plus key prefix naming a dataset or partition root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetLocation {
    pub bucket: String,
    pub prefix: String,
}

impl DatasetLocation {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Key of an object directly below this location
    pub fn child_key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.prefix)
        }
    }

    /// Location of a child directory
    pub fn join(&self, name: &str) -> Self {
        Self::new(self.bucket.clone(), self.child_key(name))
    }
}

impl fmt::Display for DatasetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/", self.bucket, self.prefix)
    }
}

/// Storage substrate used by the loader, the batch reader and the writer
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Read a whole object
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Store a whole object, replacing any previous version
    fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Keys below `prefix`, sorted
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Open a new object for streaming writes; fails if the key already exists
    fn create_object(&self, bucket: &str, key: &str)
        -> Result<Box<dyn Write + Send>, StorageError>;

    /// Stream a header-bearing tabular dataset as batches of at most
    /// `batch_size` records. Batches never span two files.
    fn read_dataset(
        &self,
        location: &DatasetLocation,
        batch_size: usize,
    ) -> Result<RowBatchStream, StorageError>;
}
