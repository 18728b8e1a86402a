//! Filesystem-backed fixtures for the scoring pipeline.

use chrono::NaiveDate;
use churn_scoring::artifact::{ArtifactError, ModelArtifact};
use churn_scoring::models::{FeatureMatrix, ScoredRecord};
use churn_scoring::storage::{DatasetLocation, LocalObjectStore, ObjectStore, RowBatchStream, StorageError};
use churn_scoring::ScoringJobSpec;
use serde_json::json;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const BUCKET: &str = "churn-prediction-bucket";
pub const MODEL_KEY: &str = "models/churn_prediction_pipeline.json";
pub const INPUT_PATH: &str = "raw-input";
pub const OUTPUT_PATH: &str = "pred_output";

pub const INPUT_HEADER: &str = "customerID,gender,tenure,Contract,MonthlyCharges,TotalCharges";

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

/// One input line in [`INPUT_HEADER`] order
pub fn customer(id: &str, tenure: &str, contract: &str, total_charges: &str) -> String {
    format!("{id},Female,{tenure},{contract},70.35,{total_charges}")
}

/// Logistic pipeline in which the contract type dominates: month-to-month
/// customers score above 0.5, two-year customers below, for any tenure up to
/// five years.
pub fn pipeline_document() -> serde_json::Value {
    json!({
        "format_version": 1,
        "model_version": "churn-test-v1",
        "estimator": { "kind": "logistic_regression", "intercept": 0.0 },
        "features": [
            { "type": "numeric", "column": "tenure", "mean": 12.0, "scale": 12.0, "coefficient": -0.5 },
            { "type": "numeric", "column": "TotalCharges", "mean": 1000.0, "scale": 1000.0, "coefficient": 0.0 },
            { "type": "categorical", "column": "Contract",
              "weights": { "Month-to-month": 2.0, "One year": 0.0, "Two year": -2.0 } }
        ]
    })
}

/// A temporary object store seeded with the churn bucket layout
pub struct ChurnFixture {
    pub dir: TempDir,
    pub store: Arc<LocalObjectStore>,
}

impl ChurnFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(LocalObjectStore::new(dir.path()));
        Self { dir, store }
    }

    /// Fixture with the test pipeline already uploaded
    pub fn with_model() -> Self {
        let fixture = Self::new();
        fixture.write_model(&pipeline_document());
        fixture
    }

    pub fn write_model(&self, document: &serde_json::Value) {
        self.store
            .put_object(
                BUCKET,
                MODEL_KEY,
                &serde_json::to_vec(document).expect("serialize pipeline"),
            )
            .expect("upload model");
    }

    /// Write one input file under the input prefix
    pub fn write_input(&self, file: &str, lines: &[String]) {
        let mut contents = String::from(INPUT_HEADER);
        contents.push('\n');
        for line in lines {
            contents.push_str(line);
            contents.push('\n');
        }
        self.store
            .put_object(BUCKET, &format!("{INPUT_PATH}/{file}"), contents.as_bytes())
            .expect("upload input");
    }

    pub fn object_store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn spec(&self) -> ScoringJobSpec {
        ScoringJobSpec {
            bucket: BUCKET.to_string(),
            model_key: MODEL_KEY.to_string(),
            input_path: INPUT_PATH.to_string(),
            output_path: OUTPUT_PATH.to_string(),
            batch_size: 100,
            threshold: 0.5,
            worker_count: 2,
            write_header: true,
        }
    }

    pub fn partition_prefix(&self, processing_date: NaiveDate) -> String {
        format!(
            "{OUTPUT_PATH}/processing_date={}",
            processing_date.format("%Y-%m-%d")
        )
    }

    /// Part files of a date partition, sorted
    pub fn output_keys(&self, processing_date: NaiveDate) -> Vec<String> {
        self.store
            .list_objects(BUCKET, &self.partition_prefix(processing_date))
            .expect("list output")
    }

    /// Every scored record of a date partition, sorted by userid
    pub fn read_output(&self, processing_date: NaiveDate) -> Vec<ScoredRecord> {
        let mut records = Vec::new();
        for key in self.output_keys(processing_date) {
            records.extend(self.read_part(&key, true));
        }
        records.sort_by(|a, b| a.userid.cmp(&b.userid));
        records
    }

    pub fn read_part(&self, key: &str, has_headers: bool) -> Vec<ScoredRecord> {
        let bytes = self.store.get_object(BUCKET, key).expect("read part");
        csv::ReaderBuilder::new()
            .has_headers(has_headers)
            .from_reader(bytes.as_slice())
            .deserialize::<ScoredRecord>()
            .collect::<Result<Vec<_>, _>>()
            .expect("decode part")
    }
}

/// Artifact returning the same probability for every row
#[derive(Debug)]
pub struct ConstantArtifact {
    pub probability: f64,
    pub required: Vec<String>,
    pub calls: AtomicUsize,
}

impl ConstantArtifact {
    pub fn new(probability: f64) -> Self {
        Self {
            probability,
            required: vec!["tenure".to_string(), "TotalCharges".to_string()],
            calls: AtomicUsize::new(0),
        }
    }

    pub fn requiring(mut self, columns: &[&str]) -> Self {
        self.required = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

impl ModelArtifact for ConstantArtifact {
    fn model_version(&self) -> &str {
        "constant"
    }

    fn required_features(&self) -> &[String] {
        &self.required
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ArtifactError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.probability; features.len()])
    }
}

/// Object store wrapper counting `get_object` calls
#[derive(Debug)]
pub struct CountingStore {
    inner: LocalObjectStore,
    pub gets: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: LocalObjectStore) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
        }
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl ObjectStore for CountingStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(bucket, key)
    }

    fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.inner.put_object(bucket, key, bytes)
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        self.inner.list_objects(bucket, prefix)
    }

    fn create_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn Write + Send>, StorageError> {
        self.inner.create_object(bucket, key)
    }

    fn read_dataset(
        &self,
        location: &DatasetLocation,
        batch_size: usize,
    ) -> Result<RowBatchStream, StorageError> {
        self.inner.read_dataset(location, batch_size)
    }
}
