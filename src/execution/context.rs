use crate::artifact::{ArtifactError, ArtifactLocation, ModelArtifact, ModelLoader};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Everything fixed for the lifetime of one execution.
///
/// The artifact is loaded exactly once when the context starts and shared by
/// every scoring lane; the processing date is computed once, so a run that
/// crosses midnight still writes a single partition.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    run_id: String,
    processing_date: NaiveDate,
    started_at: DateTime<Utc>,
    artifact: Arc<dyn ModelArtifact>,
}

impl ExecutionContext {
    /// Load the artifact and fix the run id and processing date
    pub fn start(
        loader: &ModelLoader,
        location: &ArtifactLocation,
        processing_date: Option<NaiveDate>,
    ) -> Result<Self, ArtifactError> {
        let artifact = loader.load(location)?;
        let context = Self::with_artifact(
            artifact,
            processing_date.unwrap_or_else(|| Utc::now().date_naive()),
        );

        info!(
            run_id = %context.run_id,
            processing_date = %context.processing_date,
            model_version = %context.artifact.model_version(),
            "🚀 EXECUTION: Context started"
        );
        Ok(context)
    }

    /// Context around an already-loaded artifact
    pub fn with_artifact(artifact: Arc<dyn ModelArtifact>, processing_date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            processing_date,
            started_at: Utc::now(),
            artifact,
        }
    }

    /// Unique per execution; names the output part files
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn processing_date(&self) -> NaiveDate {
        self.processing_date
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn artifact(&self) -> Arc<dyn ModelArtifact> {
        Arc::clone(&self.artifact)
    }
}
