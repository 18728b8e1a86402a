//! # System Constants
//!
//! Column names, thresholds and default operational values shared by the
//! scoring engine, the output writer and the job orchestrator.

use std::time::Duration;

/// Input column names as they appear in the header row of the raw dataset
pub mod columns {
    /// Unique key of a customer within a batch
    pub const CUSTOMER_ID: &str = "customerID";
    /// Months the customer has been subscribed; `0` rows are never scored
    pub const TENURE: &str = "tenure";
    /// Lifetime charges; may be malformed or missing in the raw data
    pub const TOTAL_CHARGES: &str = "TotalCharges";

    /// Columns every input file must carry
    pub const REQUIRED: [&str; 3] = [CUSTOMER_ID, TENURE, TOTAL_CHARGES];
}

/// Output column names of the scored dataset
pub mod output {
    pub const USERID: &str = "userid";
    pub const PREDICTION_PROBA: &str = "prediction_proba";
    pub const PREDICTION: &str = "prediction";
    /// Partition column; encoded in the directory name, not in the files
    pub const PROCESSING_DATE: &str = "processing_date";
}

/// Probability cutoff converting a score into a binary churn decision
pub const THRESHOLD: f64 = 0.5;

/// Rows per batch when streaming the input dataset.
///
/// Imputation is batch-local, so this value determines the imputed numbers.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Argument keys understood by the scoring job, passed through the job
/// definition's default arguments
pub mod job_arguments {
    pub const BUCKET: &str = "--bucket";
    pub const MODEL_KEY: &str = "--model-key";
    pub const INPUT_PATH: &str = "--input-path";
    pub const OUTPUT_PATH: &str = "--output-path";
    pub const BATCH_SIZE: &str = "--batch-size";
    pub const THRESHOLD: &str = "--threshold";
    pub const WRITE_HEADER: &str = "--write-header";
    pub const TEMP_DIR: &str = "--TempDir";
    pub const JOB_LANGUAGE: &str = "--job-language";
    pub const ADDITIONAL_MODULES: &str = "--additional-modules";
}

/// Polling defaults for the job orchestrator
pub mod polling {
    use super::Duration;

    /// Interval of the reference (fixed) poll loop
    pub const REFERENCE_INTERVAL: Duration = Duration::from_secs(30);
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
    pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(240);
    pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(90 * 60);
}

/// Job definition defaults
pub mod job {
    pub const DEFAULT_NAME: &str = "churn-prediction-inference-job";
    pub const DEFAULT_WORKER_TYPE: &str = "G.1X";
    pub const DEFAULT_WORKER_COUNT: u32 = 2;
    pub const DEFAULT_TIMEOUT_MINUTES: u64 = 60;
    pub const SCRIPT_LANGUAGE: &str = "rust";
}

/// Part file extension used by the output writer
pub const PART_FILE_EXTENSION: &str = "csv";
