//! # Artifact Error Types

use thiserror::Error;

/// Failures while acquiring or querying a model artifact
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("ArtifactUnavailable: {location}: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("ArtifactCorrupt: {location}: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("ArtifactIncompatible: {location}: {reason}")]
    Incompatible { location: String, reason: String },

    #[error("Feature column '{column}' is not present in the feature matrix")]
    MissingFeature { column: String },

    #[error("Invalid value '{value}' for numeric feature '{column}' at row {row}")]
    InvalidFeatureValue {
        column: String,
        row: usize,
        value: String,
    },
}

impl ArtifactError {
    pub fn unavailable(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Attach the storage location to a decoding failure
    pub fn from_decode(location: impl Into<String>, error: ArtifactDecodeError) -> Self {
        let location = location.into();
        match error {
            ArtifactDecodeError::Corrupt(reason) => Self::Corrupt { location, reason },
            ArtifactDecodeError::Incompatible(reason) => Self::Incompatible { location, reason },
        }
    }

    /// Errors raised while acquiring the artifact, as opposed to querying it
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Corrupt { .. } | Self::Incompatible { .. }
        )
    }
}

/// Decoding outcome independent of where the bytes came from
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactDecodeError {
    #[error("{0}")]
    Corrupt(String),

    #[error("{0}")]
    Incompatible(String),
}
