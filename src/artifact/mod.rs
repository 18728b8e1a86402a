//! # Model Loader
//!
//! Fetches the serialized churn pipeline from the object store once per
//! execution context and exposes it as a shared, read-only
//! [`ModelArtifact`].
//!
//! ```rust,no_run
//! use churn_scoring::artifact::{ArtifactLocation, ModelLoader};
//! use churn_scoring::storage::LocalObjectStore;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(LocalObjectStore::new("/var/lib/churn"));
//! let loader = ModelLoader::new(store);
//! let artifact = loader.load(&ArtifactLocation::new(
//!     "churn-bucket",
//!     "models/churn_prediction_pipeline.json",
//! ))?;
//! println!("loaded model {}", artifact.model_version());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod loader;
pub mod pipeline;

pub use errors::{ArtifactDecodeError, ArtifactError};
pub use loader::{ArtifactLocation, ModelLoader};
pub use pipeline::{
    EstimatorSpec, FeatureSpec, ModelArtifact, PipelineArtifact, PipelineDocument,
    SUPPORTED_FORMAT_VERSION,
};
