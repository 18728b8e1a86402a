use crate::storage::{ObjectStore, StorageError};
use tracing::info;

/// Split `<bucket>/<key>` as used by `JobDefinition::script_location`
pub fn split_location(location: &str) -> Result<(&str, &str), StorageError> {
    let trimmed = location.trim_start_matches('/');
    match trimmed.split_once('/') {
        Some((bucket, key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
        _ => Err(StorageError::InvalidKey {
            key: location.to_string(),
            reason: "expected <bucket>/<key>".to_string(),
        }),
    }
}

/// Upload the job script to its location before the definition is created.
/// Re-staging replaces the previous script.
pub fn stage_job_script(
    store: &dyn ObjectStore,
    script_location: &str,
    contents: &[u8],
) -> Result<(), StorageError> {
    let (bucket, key) = split_location(script_location)?;
    store.put_object(bucket, key, contents)?;
    info!(
        script_location,
        bytes = contents.len(),
        "📦 Job script staged"
    );
    Ok(())
}
