use super::context::ExecutionContext;
use super::errors::JobError;
use crate::artifact::{ArtifactLocation, ModelLoader};
use crate::backend::JobDefinition;
use crate::config::ScoringConfig;
use crate::constants::{self, job_arguments};
use crate::logging::log_batch_operation;
use crate::models::RowBatch;
use crate::schema::OutputSchema;
use crate::scoring::PartitionScorer;
use crate::storage::{DatasetLocation, ObjectStore};
use crate::writer::{OutputPartition, OutputWriter, PartSummary};
use chrono::NaiveDate;
use crossbeam::channel::{self, Receiver};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Parameters of one scoring execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringJobSpec {
    pub bucket: String,
    pub model_key: String,
    pub input_path: String,
    pub output_path: String,
    pub batch_size: usize,
    pub threshold: f64,
    /// Number of scoring lanes
    pub worker_count: usize,
    pub write_header: bool,
}

impl ScoringJobSpec {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            bucket: config.bucket.clone(),
            model_key: config.model_key.clone(),
            input_path: config.input_path.clone(),
            output_path: config.output_path.clone(),
            batch_size: config.batch_size,
            threshold: config.threshold,
            worker_count: config.worker_count,
            write_header: config.write_header,
        }
    }

    /// Read the job's parameters from a definition's default arguments, the
    /// way a managed execution receives them. One lane per configured worker.
    pub fn from_definition(definition: &JobDefinition) -> Result<Self, JobError> {
        let required = |key: &str| {
            definition
                .argument(key)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| JobError::invalid_argument(key, "argument is required"))
        };

        let batch_size = match definition.argument(job_arguments::BATCH_SIZE) {
            None => constants::DEFAULT_BATCH_SIZE,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    JobError::invalid_argument(
                        job_arguments::BATCH_SIZE,
                        format!("'{raw}' is not a positive integer"),
                    )
                })?,
        };

        let threshold = match definition.argument(job_arguments::THRESHOLD) {
            None => constants::THRESHOLD,
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| (0.0..=1.0).contains(t))
                .ok_or_else(|| {
                    JobError::invalid_argument(
                        job_arguments::THRESHOLD,
                        format!("'{raw}' is not a probability"),
                    )
                })?,
        };

        let write_header = match definition.argument(job_arguments::WRITE_HEADER) {
            None => true,
            Some(raw) => raw.trim().parse::<bool>().map_err(|_| {
                JobError::invalid_argument(
                    job_arguments::WRITE_HEADER,
                    format!("'{raw}' is not a boolean"),
                )
            })?,
        };

        Ok(Self {
            bucket: required(job_arguments::BUCKET)?,
            model_key: required(job_arguments::MODEL_KEY)?,
            input_path: required(job_arguments::INPUT_PATH)?,
            output_path: required(job_arguments::OUTPUT_PATH)?,
            batch_size,
            threshold,
            worker_count: definition.worker_count.max(1) as usize,
            write_header,
        })
    }
}

/// What one finished execution produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub run_id: String,
    pub processing_date: NaiveDate,
    pub model_version: String,
    pub batches: u64,
    pub rows_read: u64,
    pub rows_scored: u64,
    pub positives: u64,
    pub parts: Vec<PartSummary>,
    pub elapsed: Duration,
}

impl JobSummary {
    /// Records dropped by the `tenure == 0` filter
    pub fn rows_filtered(&self) -> u64 {
        self.rows_read - self.rows_scored
    }
}

#[derive(Debug, Default)]
struct LaneReport {
    batches: u64,
    rows_read: u64,
    rows_scored: u64,
    positives: u64,
    part: Option<PartSummary>,
}

/// The remote execution unit: load the model once, stream the input through
/// the scorer on `worker_count` lanes and append the results.
#[derive(Debug, Clone)]
pub struct ScoringJob {
    store: Arc<dyn ObjectStore>,
    spec: ScoringJobSpec,
    processing_date: Option<NaiveDate>,
    stop: Arc<AtomicBool>,
}

impl ScoringJob {
    pub fn new(store: Arc<dyn ObjectStore>, spec: ScoringJobSpec) -> Self {
        Self {
            store,
            spec,
            processing_date: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pin the processing date instead of taking today's
    pub fn with_processing_date(mut self, processing_date: NaiveDate) -> Self {
        self.processing_date = Some(processing_date);
        self
    }

    pub fn spec(&self) -> &ScoringJobSpec {
        &self.spec
    }

    /// Setting the flag makes the lanes stop after their current batch
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run the execution to completion on the calling thread plus one scoped
    /// thread per lane
    pub fn run(&self) -> Result<JobSummary, JobError> {
        let started = Instant::now();
        let spec = &self.spec;

        let loader = ModelLoader::new(Arc::clone(&self.store));
        let context = ExecutionContext::start(
            &loader,
            &ArtifactLocation::new(&spec.bucket, &spec.model_key),
            self.processing_date,
        )?;

        let scorer = PartitionScorer::new(context.artifact(), spec.threshold);
        let writer = OutputWriter::new(
            Arc::clone(&self.store),
            OutputPartition::new(
                DatasetLocation::new(&spec.bucket, &spec.output_path),
                context.processing_date(),
            ),
            OutputSchema::scored_records(spec.threshold),
            context.run_id(),
        )
        .with_header(spec.write_header);

        let input = DatasetLocation::new(&spec.bucket, &spec.input_path);
        let batches = self.store.read_dataset(&input, spec.batch_size)?;

        let lanes = spec.worker_count.max(1);
        let abort = AtomicBool::new(false);
        let feed_error: Mutex<Option<JobError>> = Mutex::new(None);
        let (sender, receiver) = channel::bounded::<(u64, RowBatch)>(lanes * 2);

        info!(
            run_id = %context.run_id(),
            input = %input,
            output = %writer.partition().location(),
            lanes,
            batch_size = spec.batch_size,
            "🔄 EXECUTION: Scoring started"
        );

        let lane_results: Vec<Result<LaneReport, JobError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..lanes)
                .map(|lane| {
                    let receiver = receiver.clone();
                    let scorer = &scorer;
                    let writer = &writer;
                    let abort = &abort;
                    let stop = self.stop.as_ref();
                    scope.spawn(move || {
                        let result = run_lane(lane, receiver, scorer, writer, abort, stop);
                        if result.is_err() {
                            abort.store(true, Ordering::SeqCst);
                        }
                        result
                    })
                })
                .collect();
            drop(receiver);

            for (index, batch) in (0u64..).zip(batches) {
                if abort.load(Ordering::SeqCst) || self.stop.load(Ordering::SeqCst) {
                    break;
                }
                match batch {
                    Ok(batch) => {
                        if sender.send((index, batch)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        abort.store(true, Ordering::SeqCst);
                        *feed_error.lock() = Some(e.into());
                        break;
                    }
                }
            }
            drop(sender);

            handles
                .into_iter()
                .enumerate()
                .map(|(lane, handle)| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(JobError::LanePanicked { lane }))
                })
                .collect()
        });

        if self.stop.load(Ordering::SeqCst) {
            warn!(run_id = %context.run_id(), "Execution stopped before completion");
            return Err(JobError::Stopped);
        }

        let mut summary = JobSummary {
            run_id: context.run_id().to_string(),
            processing_date: context.processing_date(),
            model_version: context.artifact().model_version().to_string(),
            batches: 0,
            rows_read: 0,
            rows_scored: 0,
            positives: 0,
            parts: Vec::new(),
            elapsed: Duration::ZERO,
        };
        let mut first_error = feed_error.into_inner();

        for result in lane_results {
            match result {
                Ok(report) => {
                    summary.batches += report.batches;
                    summary.rows_read += report.rows_read;
                    summary.rows_scored += report.rows_scored;
                    summary.positives += report.positives;
                    summary.parts.extend(report.part);
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            error!(run_id = %summary.run_id, error = %e, "❌ EXECUTION: Scoring failed");
            return Err(e);
        }

        summary.parts.sort_by(|a, b| a.key.cmp(&b.key));
        summary.elapsed = started.elapsed();

        info!(
            run_id = %summary.run_id,
            batches = summary.batches,
            rows_read = summary.rows_read,
            rows_scored = summary.rows_scored,
            positives = summary.positives,
            parts = summary.parts.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "✅ EXECUTION: Scoring completed"
        );
        Ok(summary)
    }
}

fn run_lane(
    lane: usize,
    batches: Receiver<(u64, RowBatch)>,
    scorer: &PartitionScorer,
    writer: &OutputWriter,
    abort: &AtomicBool,
    stop: &AtomicBool,
) -> Result<LaneReport, JobError> {
    let mut sink = writer.sink(lane);
    let mut report = LaneReport::default();

    for (index, batch) in batches.iter() {
        if abort.load(Ordering::SeqCst) || stop.load(Ordering::SeqCst) {
            break;
        }

        let started = Instant::now();
        let scored = scorer.score_batch(&batch)?;
        sink.write(&scored)?;

        log_batch_operation(
            lane,
            index,
            batch.len(),
            scored.len(),
            scored.positive_count(),
            started.elapsed().as_millis() as u64,
        );

        report.batches += 1;
        report.rows_read += batch.len() as u64;
        report.rows_scored += scored.len() as u64;
        report.positives += scored.positive_count() as u64;
    }

    report.part = sink.finish()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChurnConfig;

    #[test]
    fn test_spec_from_definition_arguments() {
        let mut config = ChurnConfig::default();
        config.scoring.batch_size = 250;
        config.scoring.threshold = 0.6;
        config.job.worker_count = 4;
        let spec = ScoringJobSpec::from_definition(&JobDefinition::from_config(&config)).unwrap();

        assert_eq!(spec.bucket, "churn-prediction-bucket");
        assert_eq!(spec.input_path, "raw-input");
        assert_eq!(spec.batch_size, 250);
        assert_eq!(spec.threshold, 0.6);
        assert_eq!(spec.worker_count, 4);
        assert!(spec.write_header);
    }

    #[test]
    fn test_spec_defaults_optional_arguments() {
        let mut definition = JobDefinition::from_config(&ChurnConfig::default());
        definition.default_arguments.remove("--batch-size");
        definition.default_arguments.remove("--threshold");
        definition.default_arguments.remove("--write-header");
        let spec = ScoringJobSpec::from_definition(&definition).unwrap();
        assert_eq!(spec.batch_size, 10_000);
        assert_eq!(spec.threshold, 0.5);
        assert!(spec.write_header);
    }

    #[test]
    fn test_spec_rejects_bad_arguments() {
        let mut definition = JobDefinition::from_config(&ChurnConfig::default());
        definition.default_arguments.remove("--model-key");
        assert!(matches!(
            ScoringJobSpec::from_definition(&definition),
            Err(JobError::InvalidArgument { .. })
        ));

        let mut definition = JobDefinition::from_config(&ChurnConfig::default());
        definition
            .default_arguments
            .insert("--batch-size".to_string(), "0".to_string());
        let err = ScoringJobSpec::from_definition(&definition).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid job argument --batch-size: '0' is not a positive integer"
        );
    }
}
