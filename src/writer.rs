//! # Output Writer
//!
//! Appends scored batches to a date-partitioned dataset. Every write unit is a
//! brand-new part file under `<output>/processing_date=<date>/`; existing
//! files are never opened, so repeated and concurrent runs only ever add data.

use crate::models::ScoredBatch;
use crate::schema::{OutputSchema, SchemaViolation};
use crate::storage::{DatasetLocation, ObjectStore, StorageError};
use crate::constants::{output, PART_FILE_EXTENSION};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Schema contract violated: {0}")]
    Schema(#[from] SchemaViolation),

    #[error("Output storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to encode output file {key}: {message}")]
    Encoding { key: String, message: String },
}

/// The date partition one execution writes into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPartition {
    base: DatasetLocation,
    processing_date: NaiveDate,
}

impl OutputPartition {
    pub fn new(base: DatasetLocation, processing_date: NaiveDate) -> Self {
        Self {
            base,
            processing_date,
        }
    }

    pub fn processing_date(&self) -> NaiveDate {
        self.processing_date
    }

    /// `processing_date=YYYY-MM-DD`
    pub fn directory_name(&self) -> String {
        format!(
            "{}={}",
            output::PROCESSING_DATE,
            self.processing_date.format("%Y-%m-%d")
        )
    }

    pub fn location(&self) -> DatasetLocation {
        self.base.join(&self.directory_name())
    }
}

/// Outcome of one finished part file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartSummary {
    pub key: String,
    pub rows: u64,
}

/// Append-only writer for one execution's partition
#[derive(Debug, Clone)]
pub struct OutputWriter {
    store: Arc<dyn ObjectStore>,
    partition: OutputPartition,
    schema: OutputSchema,
    run_id: String,
    write_header: bool,
}

impl OutputWriter {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        partition: OutputPartition,
        schema: OutputSchema,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            partition,
            schema,
            run_id: run_id.into(),
            write_header: true,
        }
    }

    pub fn with_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    pub fn partition(&self) -> &OutputPartition {
        &self.partition
    }

    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    /// Key of the part file owned by `lane` in this run
    pub fn part_key(&self, lane: usize) -> String {
        self.partition.location().child_key(&format!(
            "part-{}-{lane:05}.{PART_FILE_EXTENSION}",
            self.run_id
        ))
    }

    /// A lazily-opened sink for one lane
    pub fn sink(&self, lane: usize) -> LaneSink {
        LaneSink {
            writer: self.clone(),
            lane,
            part: None,
        }
    }

    /// Write a whole sequence of batches as one write unit
    pub fn write_batches<I>(&self, lane: usize, batches: I) -> Result<Option<PartSummary>, WriterError>
    where
        I: IntoIterator<Item = ScoredBatch>,
    {
        let mut sink = self.sink(lane);
        for batch in batches {
            sink.write(&batch)?;
        }
        sink.finish()
    }

    fn open_part(&self, lane: usize) -> Result<PartFile, WriterError> {
        let key = self.part_key(lane);
        let location = self.partition.location();
        let target = self.store.create_object(&location.bucket, &key)?;

        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(target);

        if self.write_header {
            csv.write_record(self.schema.header())
                .map_err(|e| WriterError::Encoding {
                    key: key.clone(),
                    message: e.to_string(),
                })?;
        }

        debug!(key = %key, lane, "Opened output part file");
        Ok(PartFile { key, csv, rows: 0 })
    }
}

struct PartFile {
    key: String,
    csv: csv::Writer<Box<dyn Write + Send>>,
    rows: u64,
}

/// Per-lane sink; the part file is only created once there is a row to write
pub struct LaneSink {
    writer: OutputWriter,
    lane: usize,
    part: Option<PartFile>,
}

impl LaneSink {
    /// Validate a batch against the schema contract and append it
    pub fn write(&mut self, batch: &ScoredBatch) -> Result<(), WriterError> {
        self.writer.schema.validate(batch)?;

        if batch.is_empty() {
            return Ok(());
        }

        if self.part.is_none() {
            self.part = Some(self.writer.open_part(self.lane)?);
        }

        if let Some(part) = self.part.as_mut() {
            for record in batch.records() {
                part.csv.serialize(record).map_err(|e| WriterError::Encoding {
                    key: part.key.clone(),
                    message: e.to_string(),
                })?;
            }
            part.rows += batch.len() as u64;
        }
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.part.as_ref().map_or(0, |p| p.rows)
    }

    /// Flush the part file, if one was opened
    pub fn finish(self) -> Result<Option<PartSummary>, WriterError> {
        let Some(mut part) = self.part else {
            return Ok(None);
        };

        part.csv.flush().map_err(|e| {
            WriterError::Storage(StorageError::io(part.key.clone(), e))
        })?;

        info!(key = %part.key, rows = part.rows, "Output part file written");
        Ok(Some(PartSummary {
            key: part.key,
            rows: part.rows,
        }))
    }
}
