//! # Configuration System
//!
//! Layered, environment-aware configuration for the scoring job and its
//! orchestrator. Sources are merged in order, later ones winning:
//!
//! 1. built-in defaults ([`ChurnConfig::default`])
//! 2. `config/churn-scoring.toml` (optional)
//! 3. `config/churn-scoring.<environment>.toml` (optional)
//! 4. environment variables prefixed `CHURN__`, sections separated by `__`
//!    (e.g. `CHURN__SCORING__BUCKET=my-bucket`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use churn_scoring::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let config = manager.config();
//! println!("scoring {} every {:?}", config.scoring.input_path, config.polling.initial_interval());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{self, job, polling};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChurnConfig {
    pub scoring: ScoringConfig,
    pub job: JobConfig,
    pub polling: PollingConfig,
    pub storage: StorageConfig,
}

/// Parameters of the scoring execution itself
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Bucket holding the model, the raw input and the scored output
    pub bucket: String,
    pub model_key: String,
    pub input_path: String,
    pub output_path: String,
    pub threshold: f64,
    /// Rows per batch; imputation is batch-local so this is pinned
    pub batch_size: usize,
    /// Scoring lanes inside one execution
    pub worker_count: usize,
    pub write_header: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            bucket: "churn-prediction-bucket".to_string(),
            model_key: "models/churn_prediction_pipeline.json".to_string(),
            input_path: "raw-input".to_string(),
            output_path: "pred_output".to_string(),
            threshold: constants::THRESHOLD,
            batch_size: constants::DEFAULT_BATCH_SIZE,
            worker_count: 2,
            write_header: true,
        }
    }
}

/// Job definition registered with the execution backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct JobConfig {
    pub name: String,
    /// Execution role; opaque to this crate
    pub role: String,
    /// Bucket holding the job script and temporary files
    pub asset_bucket: String,
    pub script_key: String,
    /// Temporary directory key; defaults to `tmp/` in the asset bucket
    pub temp_dir: Option<String>,
    pub worker_type: String,
    pub worker_count: u32,
    pub timeout_minutes: u64,
    /// Feature-processing libraries the execution environment must install
    pub additional_modules: Vec<String>,
    pub region: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: job::DEFAULT_NAME.to_string(),
            role: "churn-scoring-execution-role".to_string(),
            asset_bucket: "churn-job-assets".to_string(),
            script_key: "churn-predict-script/scoring-job.toml".to_string(),
            temp_dir: None,
            worker_type: job::DEFAULT_WORKER_TYPE.to_string(),
            worker_count: job::DEFAULT_WORKER_COUNT,
            timeout_minutes: job::DEFAULT_TIMEOUT_MINUTES,
            additional_modules: vec!["csv".to_string(), "serde_json".to_string()],
            region: "us-east-1".to_string(),
        }
    }
}

impl JobConfig {
    /// Execution timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes * 60)
    }

    /// `<asset_bucket>/<script_key>`
    pub fn script_location(&self) -> String {
        format!("{}/{}", self.asset_bucket, self.script_key)
    }

    pub fn temp_dir(&self) -> String {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| format!("{}/tmp/", self.asset_bucket))
    }
}

/// Poll policy of the orchestrator
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub initial_interval_seconds: u64,
    pub backoff_multiplier: f64,
    pub max_interval_seconds: u64,
    /// `0` waits without bound
    pub max_wait_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_interval_seconds: polling::REFERENCE_INTERVAL.as_secs(),
            backoff_multiplier: polling::DEFAULT_BACKOFF_MULTIPLIER,
            max_interval_seconds: polling::DEFAULT_MAX_INTERVAL.as_secs(),
            max_wait_seconds: polling::DEFAULT_MAX_WAIT.as_secs(),
        }
    }
}

impl PollingConfig {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_secs(self.initial_interval_seconds)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_seconds)
    }

    /// Maximum total wait, `None` when unbounded
    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_seconds > 0).then(|| Duration::from_secs(self.max_wait_seconds))
    }
}

/// Local object store settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory whose subdirectories act as buckets
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

impl ChurnConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let required = [
            ("scoring.bucket", &self.scoring.bucket),
            ("scoring.model_key", &self.scoring.model_key),
            ("scoring.input_path", &self.scoring.input_path),
            ("scoring.output_path", &self.scoring.output_path),
            ("job.name", &self.job.name),
            ("job.role", &self.job.role),
            ("job.asset_bucket", &self.job.asset_bucket),
            ("job.script_key", &self.job.script_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    field,
                    "churn scoring configuration",
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.scoring.threshold) {
            return Err(ConfigurationError::invalid_value(
                "scoring.threshold",
                self.scoring.threshold.to_string(),
                "threshold must lie in [0, 1]",
            ));
        }

        if self.scoring.batch_size == 0 {
            return Err(ConfigurationError::invalid_value(
                "scoring.batch_size",
                "0",
                "batch size must be greater than 0",
            ));
        }

        if self.scoring.worker_count == 0 {
            return Err(ConfigurationError::invalid_value(
                "scoring.worker_count",
                "0",
                "at least one scoring lane is required",
            ));
        }

        if self.job.worker_count == 0 {
            return Err(ConfigurationError::invalid_value(
                "job.worker_count",
                "0",
                "worker count must be greater than 0",
            ));
        }

        if self.job.timeout_minutes == 0 {
            return Err(ConfigurationError::invalid_value(
                "job.timeout_minutes",
                "0",
                "timeout must be greater than 0",
            ));
        }

        if self.job.additional_modules.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "job.additional_modules",
                "the execution environment needs its feature-processing libraries",
            ));
        }

        if self.polling.initial_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "polling.initial_interval_seconds",
                "0",
                "poll interval must be greater than 0",
            ));
        }

        if self.polling.backoff_multiplier < 1.0 || !self.polling.backoff_multiplier.is_finite() {
            return Err(ConfigurationError::invalid_value(
                "polling.backoff_multiplier",
                self.polling.backoff_multiplier.to_string(),
                "multiplier must be a finite value >= 1.0",
            ));
        }

        if self.polling.max_interval_seconds < self.polling.initial_interval_seconds {
            return Err(ConfigurationError::invalid_value(
                "polling.max_interval_seconds",
                self.polling.max_interval_seconds.to_string(),
                "max interval must not be below the initial interval",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ChurnConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scoring.batch_size, 10_000);
        assert_eq!(config.polling.initial_interval(), Duration::from_secs(30));
        assert_eq!(config.polling.max_wait(), Some(Duration::from_secs(5400)));
        assert_eq!(config.job.timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_zero_max_wait_is_unbounded() {
        let mut config = ChurnConfig::default();
        config.polling.max_wait_seconds = 0;
        assert_eq!(config.polling.max_wait(), None);
    }

    #[test]
    fn test_job_locations() {
        let job = JobConfig::default();
        assert_eq!(
            job.script_location(),
            "churn-job-assets/churn-predict-script/scoring-job.toml"
        );
        assert_eq!(job.temp_dir(), "churn-job-assets/tmp/");
    }

    #[test]
    fn test_validation_failures() {
        let mut config = ChurnConfig::default();
        config.scoring.threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { .. })
        ));

        let mut config = ChurnConfig::default();
        config.job.role = " ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));

        let mut config = ChurnConfig::default();
        config.polling.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = ChurnConfig::default();
        config.job.additional_modules.clear();
        assert!(config.validate().is_err());
    }
}
