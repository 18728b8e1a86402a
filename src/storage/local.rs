//! # Local Object Store
//!
//! Filesystem-backed [`ObjectStore`]: object `bucket/key` lives at
//! `<root>/<bucket>/<key>`. Part files are created with create-new semantics
//! so concurrent writers can never clobber each other.

use super::{DatasetLocation, ObjectStore, RowBatchStream, StorageError};
use crate::models::{BatchSchema, InputRecord, RowBatch};
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extension of the tabular input files picked up by [`LocalObjectStore::read_dataset`]
const DATASET_FILE_EXTENSION: &str = "csv";

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            return Err(StorageError::InvalidKey {
                key: bucket.to_string(),
                reason: "bucket must be a single non-empty path segment".to_string(),
            });
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
                reason: "keys may not contain '.', '..' or root components".to_string(),
            });
        }
        Ok(self.bucket_path(bucket)?.join(relative))
    }

    fn collect_keys(
        dir: &Path,
        bucket_root: &Path,
        keys: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        let entries =
            fs::read_dir(dir).map_err(|e| StorageError::io(dir.display().to_string(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(dir.display().to_string(), e))?;
            let path = entry.path();
            if path.is_dir() {
                Self::collect_keys(&path, bucket_root, keys)?;
            } else if let Ok(relative) = path.strip_prefix(bucket_root) {
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                keys.push(key);
            }
        }
        Ok(())
    }
}

impl ObjectStore for LocalObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => StorageError::io(path.display().to_string(), e),
        })
    }

    fn put_object(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io(parent.display().to_string(), e))?;
        }
        fs::write(&path, bytes).map_err(|e| StorageError::io(path.display().to_string(), e))
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let bucket_root = self.bucket_path(bucket)?;
        let dir = self.object_path(bucket, prefix)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        if dir.is_dir() {
            Self::collect_keys(&dir, &bucket_root, &mut keys)?;
        } else {
            keys.push(prefix.trim_start_matches('/').to_string());
        }
        keys.sort();
        Ok(keys)
    }

    fn create_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Box<dyn Write + Send>, StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::io(parent.display().to_string(), e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => StorageError::AlreadyExists {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                },
                _ => StorageError::io(path.display().to_string(), e),
            })?;

        debug!(bucket = %bucket, key = %key, "Created object for append-only write");
        Ok(Box::new(BufWriter::new(file)))
    }

    fn read_dataset(
        &self,
        location: &DatasetLocation,
        batch_size: usize,
    ) -> Result<RowBatchStream, StorageError> {
        let dir = self.object_path(&location.bucket, &location.prefix)?;
        if !dir.exists() {
            return Err(StorageError::NotFound {
                bucket: location.bucket.clone(),
                key: location.prefix.clone(),
            });
        }

        let files: VecDeque<(String, PathBuf)> = self
            .list_objects(&location.bucket, &location.prefix)?
            .into_iter()
            .filter(|key| is_dataset_file(key))
            .map(|key| {
                let path = self.object_path(&location.bucket, &key)?;
                Ok((key, path))
            })
            .collect::<Result<_, StorageError>>()?;

        if files.is_empty() {
            warn!(location = %location, "Dataset location contains no input files");
        } else {
            debug!(location = %location, files = files.len(), batch_size, "Streaming dataset");
        }

        Ok(Box::new(CsvBatchReader {
            files,
            current: None,
            batch_size: batch_size.max(1),
            failed: false,
        }))
    }
}

/// Hidden and marker files (`_SUCCESS`, `.part.crc`) are not data
fn is_dataset_file(key: &str) -> bool {
    let name = key.rsplit('/').next().unwrap_or(key);
    !name.starts_with(['.', '_'])
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DATASET_FILE_EXTENSION))
}

struct OpenFile {
    key: String,
    reader: csv::Reader<BufReader<File>>,
    schema: Arc<BatchSchema>,
}

/// Lazy reader yielding at most `batch_size` records per batch, one file at a time
struct CsvBatchReader {
    files: VecDeque<(String, PathBuf)>,
    current: Option<OpenFile>,
    batch_size: usize,
    failed: bool,
}

impl CsvBatchReader {
    fn open(key: String, path: &Path) -> Result<Option<OpenFile>, StorageError> {
        let file = File::open(path).map_err(|e| StorageError::io(path.display().to_string(), e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file));

        let headers = reader.headers().map_err(|e| StorageError::Csv {
            object: key.clone(),
            message: e.to_string(),
        })?;

        if headers.is_empty() {
            debug!(object = %key, "Skipping empty input file");
            return Ok(None);
        }

        let schema = BatchSchema::from_header(headers.iter()).map_err(|source| {
            StorageError::Layout {
                object: key.clone(),
                source,
            }
        })?;

        Ok(Some(OpenFile {
            key,
            reader,
            schema: Arc::new(schema),
        }))
    }

    fn read_batch(open: &mut OpenFile, batch_size: usize) -> Result<Vec<InputRecord>, StorageError> {
        let mut records = Vec::with_capacity(batch_size);
        let mut row = csv::StringRecord::new();
        while records.len() < batch_size {
            let more = open.reader.read_record(&mut row).map_err(|e| StorageError::Csv {
                object: open.key.clone(),
                message: e.to_string(),
            })?;
            if !more {
                break;
            }
            records.push(InputRecord::new(
                row.iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect(),
            ));
        }
        Ok(records)
    }

    fn next_batch(&mut self) -> Result<Option<RowBatch>, StorageError> {
        loop {
            if self.current.is_none() {
                let Some((key, path)) = self.files.pop_front() else {
                    return Ok(None);
                };
                self.current = Self::open(key, &path)?;
                continue;
            }

            if let Some(open) = self.current.as_mut() {
                let records = Self::read_batch(open, self.batch_size)?;
                if records.is_empty() {
                    self.current = None;
                    continue;
                }
                let batch = RowBatch::new(Arc::clone(&open.schema), records).map_err(|source| {
                    StorageError::Layout {
                        object: open.key.clone(),
                        source,
                    }
                })?;
                return Ok(Some(batch));
            }
        }
    }
}

impl Iterator for CsvBatchReader {
    type Item = Result<RowBatch, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
