use super::errors::ArtifactError;
use super::pipeline::{ModelArtifact, PipelineArtifact};
use crate::storage::{ObjectStore, StorageError};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Bucket and key of a serialized model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl ArtifactLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Fetches and decodes model artifacts from an [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct ModelLoader {
    store: Arc<dyn ObjectStore>,
}

impl ModelLoader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Read the artifact once and return a shareable handle.
    ///
    /// Callers hold on to the returned `Arc` for the lifetime of an execution;
    /// the loader keeps no cache of its own.
    pub fn load(&self, location: &ArtifactLocation) -> Result<Arc<dyn ModelArtifact>, ArtifactError> {
        let started = Instant::now();

        let bytes = self
            .store
            .get_object(&location.bucket, &location.key)
            .map_err(|e| {
                let reason = match &e {
                    StorageError::NotFound { .. } => "no such key".to_string(),
                    other => other.to_string(),
                };
                ArtifactError::unavailable(location.to_string(), reason)
            })
            .inspect_err(|e| error!(location = %location, error = %e, "Model artifact unavailable"))?;

        let artifact = PipelineArtifact::decode(&bytes)
            .map_err(|e| ArtifactError::from_decode(location.to_string(), e))
            .inspect_err(|e| error!(location = %location, error = %e, "Model artifact rejected"))?;

        info!(
            location = %location,
            model_version = %artifact.model_version(),
            features = artifact.required_features().len(),
            bytes = bytes.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Model artifact loaded"
        );

        Ok(Arc::new(artifact))
    }
}
