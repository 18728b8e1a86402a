use super::cleaning::{clean_total_charges, parse_tenure, surviving_rows};
use super::errors::ScoringError;
use crate::artifact::ModelArtifact;
use crate::models::{BatchSchema, FeatureMatrix, FeatureValue, RowBatch, ScoredBatch, ScoredRecord};
use std::sync::Arc;
use tracing::debug;

/// Stateless `RowBatch -> ScoredBatch` transform around a shared artifact.
///
/// Cloning is cheap; clones share the same loaded artifact.
#[derive(Debug, Clone)]
pub struct PartitionScorer {
    artifact: Arc<dyn ModelArtifact>,
    threshold: f64,
}

impl PartitionScorer {
    pub fn new(artifact: Arc<dyn ModelArtifact>, threshold: f64) -> Self {
        Self {
            artifact,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn artifact(&self) -> &Arc<dyn ModelArtifact> {
        &self.artifact
    }

    /// Fail when the batch lacks any column the artifact needs
    pub fn check_features(&self, schema: &BatchSchema) -> Result<(), ScoringError> {
        let missing: Vec<String> = self
            .artifact
            .required_features()
            .iter()
            .filter(|column| !schema.contains(column))
            .cloned()
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScoringError::FeatureMismatch { missing })
        }
    }

    /// Score one batch: coerce and impute `TotalCharges`, drop `tenure == 0`,
    /// query the artifact and apply the threshold.
    pub fn score_batch(&self, batch: &RowBatch) -> Result<ScoredBatch, ScoringError> {
        let schema = batch.schema();
        self.check_features(schema)?;

        let total_charges = clean_total_charges(batch);
        let rows = surviving_rows(batch)?;

        if rows.is_empty() {
            debug!(input_rows = batch.len(), "Every record filtered out, emitting empty batch");
            return Ok(ScoredBatch::empty());
        }

        let keys = rows
            .iter()
            .map(|&row| {
                batch
                    .customer_id(row)
                    .map(str::to_string)
                    .ok_or(ScoringError::MissingIdentifier { row })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let features = build_features(batch, &rows, &total_charges)?;
        let probabilities = self.artifact.predict_proba(&features)?;

        if probabilities.len() != keys.len() {
            return Err(ScoringError::PredictionCountMismatch {
                expected: keys.len(),
                actual: probabilities.len(),
            });
        }

        let records: Vec<ScoredRecord> = keys
            .into_iter()
            .zip(probabilities)
            .map(|(userid, p)| ScoredRecord::from_probability(userid, p, self.threshold))
            .collect();

        debug!(
            input_rows = batch.len(),
            scored_rows = records.len(),
            "Scored batch"
        );

        Ok(ScoredBatch::new(records))
    }
}

/// Feature view of the surviving rows, every column except the identifier
pub fn build_features(
    batch: &RowBatch,
    rows: &[usize],
    total_charges: &[Option<f64>],
) -> Result<FeatureMatrix, ScoringError> {
    let schema = batch.schema();
    let id_index = schema.customer_id_index();
    let tenure_index = schema.tenure_index();
    let charges_index = schema.total_charges_index();

    let feature_columns: Vec<usize> = (0..schema.len()).filter(|&i| i != id_index).collect();
    let names = feature_columns
        .iter()
        .map(|&i| schema.columns()[i].clone())
        .collect();

    let mut matrix = FeatureMatrix::with_capacity(names, rows.len());
    for &row in rows {
        let record = &batch.records()[row];
        let values = feature_columns
            .iter()
            .map(|&column| {
                Ok(if column == tenure_index {
                    FeatureValue::Number(parse_tenure(batch, row)? as f64)
                } else if column == charges_index {
                    total_charges[row].map_or(FeatureValue::Missing, FeatureValue::Number)
                } else {
                    record
                        .value(column)
                        .map_or(FeatureValue::Missing, |v| FeatureValue::Text(v.to_string()))
                })
            })
            .collect::<Result<Vec<_>, ScoringError>>()?;
        matrix.push_row(values);
    }
    Ok(matrix)
}
