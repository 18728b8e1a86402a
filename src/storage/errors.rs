//! # Storage Error Types

use crate::models::DataModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("Object already exists: {bucket}/{key}")]
    AlreadyExists { bucket: String, key: String },

    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed tabular data in {object}: {message}")]
    Csv { object: String, message: String },

    #[error("Invalid dataset layout in {object}: {source}")]
    Layout {
        object: String,
        #[source]
        source: DataModelError,
    },

    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
}

impl StorageError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
