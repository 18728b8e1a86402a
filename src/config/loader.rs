//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate. Handles file
//! discovery, environment detection and layering of defaults, files and
//! environment variables.

use super::error::{ConfigResult, ConfigurationError};
use super::ChurnConfig;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Base name of the configuration files
pub const CONFIG_FILE_STEM: &str = "churn-scoring";

/// Prefix of configuration environment variables (`CHURN__SECTION__FIELD`)
pub const ENV_PREFIX: &str = "CHURN";

const SENSITIVE_PATTERNS: [&str; 5] = ["role", "credential", "secret", "token", "password"];

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: ChurnConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// An explicitly named directory must exist; the default one may be absent.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = match config_dir {
            Some(dir) if !dir.is_dir() => return Err(ConfigurationError::directory_not_found(dir)),
            Some(dir) => dir,
            None => Self::default_config_directory(),
        };

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        let manager = ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        };

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&manager.debug_config())
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = %manager.environment,
            job_name = %manager.config.job.name,
            bucket = %manager.config.scoring.bucket,
            "⚙️ CONFIG: Configuration loaded"
        );

        Ok(Arc::new(manager))
    }

    /// Wrap an already-built configuration, validating it
    pub fn from_config(config: ChurnConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &ChurnConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Configuration as JSON with sensitive fields masked, for logging
    pub fn debug_config(&self) -> serde_json::Value {
        let mut config_json = serde_json::json!(self.config);
        Self::sanitize_json_recursive(&mut config_json, &SENSITIVE_PATTERNS);
        config_json
    }

    /// Detect current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("CHURN_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// `CHURN_CONFIG_DIR`, falling back to `./config`
    fn default_config_directory() -> PathBuf {
        env::var("CHURN_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<ChurnConfig> {
        let defaults = Config::try_from(&ChurnConfig::default())
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        let base_file = config_directory.join(format!("{CONFIG_FILE_STEM}.toml"));
        let env_file = config_directory.join(format!("{CONFIG_FILE_STEM}.{environment}.toml"));

        for file in [&base_file, &env_file] {
            if file.exists() {
                debug!("Found configuration file: {}", file.display());
            }
        }

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_file).format(FileFormat::Toml).required(false))
            .add_source(File::from(env_file).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("job.additional_modules"),
            )
            .build()
            .map_err(|e| ConfigurationError::load_error(environment, e))?;

        merged
            .try_deserialize::<ChurnConfig>()
            .map_err(ConfigurationError::deserialization_error)
    }

    /// Recursively mask sensitive fields in JSON configuration
    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match val {
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            serde_json::Value::String(s) => {
                                let masked = if s.chars().count() > 4 {
                                    let chars: Vec<char> = s.chars().collect();
                                    let head: String = chars[..2].iter().collect();
                                    let tail: String = chars[chars.len() - 2..].iter().collect();
                                    format!("{head}***{tail}")
                                } else {
                                    "***".to_string()
                                };
                                serde_json::Value::String(format!("[MASKED: {masked}]"))
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
