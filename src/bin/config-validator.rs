//! # Churn Scoring Configuration Validator
//!
//! Command-line tool for validating layered configuration for an environment
//! before a job is submitted with it.

use anyhow::{Context, Result};
use churn_scoring::backend::JobDefinition;
use churn_scoring::config::loader::CONFIG_FILE_STEM;
use churn_scoring::config::ConfigManager;
use churn_scoring::orchestration::PollingPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate churn scoring configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration, then summarise it
    Validate,

    /// Print the merged configuration with sensitive fields masked
    Show,

    /// Print the job definition the orchestrator would register
    Definition,

    /// List environments that have an override file
    Environments,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Show) => show(&cli),
        Some(Commands::Definition) => show_definition(&cli),
        Some(Commands::Environments) => list_environments(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            println!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> Result<std::sync::Arc<ConfigManager>> {
    ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)
        .with_context(|| format!("loading configuration for '{}'", cli.environment))
}

fn validate(cli: &Cli) -> Result<()> {
    println!("🔧 Validating Churn Scoring Configuration");
    println!("Environment: {}", cli.environment);

    let manager = load(cli)?;
    println!("Config Directory: {}", manager.config_directory().display());
    println!("✅ Configuration loaded and validated\n");

    let config = manager.config();
    let policy = PollingPolicy::from_config(&config.polling);

    println!("📊 Scoring:");
    println!("   Model: {}/{}", config.scoring.bucket, config.scoring.model_key);
    println!("   Input: {}/{}/", config.scoring.bucket, config.scoring.input_path);
    println!("   Output: {}/{}/", config.scoring.bucket, config.scoring.output_path);
    println!(
        "   Threshold: {}  Batch size: {}  Lanes: {}",
        config.scoring.threshold, config.scoring.batch_size, config.scoring.worker_count
    );

    println!("📋 Job:");
    println!("   Name: {}", config.job.name);
    println!("   Script: {}", config.job.script_location());
    println!(
        "   Workers: {} x {}  Timeout: {:?}",
        config.job.worker_count,
        config.job.worker_type,
        config.job.timeout()
    );

    println!("⏱️ Polling:");
    println!(
        "   First interval: {:?}  Backoff: x{}  Cap: {:?}",
        policy.initial_interval, policy.backoff_multiplier, policy.max_interval
    );
    match policy.max_wait {
        Some(max_wait) => println!("   Max wait: {max_wait:?}"),
        None => println!("   Max wait: unbounded"),
    }

    println!("\n🎉 All configuration validation checks passed!");
    Ok(())
}

fn show(cli: &Cli) -> Result<()> {
    let manager = load(cli)?;
    println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
    Ok(())
}

fn show_definition(cli: &Cli) -> Result<()> {
    let manager = load(cli)?;
    let mut definition = JobDefinition::from_config(manager.config());
    definition.role = "[MASKED]".to_string();
    definition
        .validate()
        .context("job definition would be rejected by the registry")?;
    println!("{}", serde_json::to_string_pretty(&definition)?);
    Ok(())
}

fn list_environments(cli: &Cli) -> Result<()> {
    let dir = cli.config_dir.clone().unwrap_or_else(|| PathBuf::from("config"));
    println!("📋 Environments in {}:", dir.display());

    let prefix = format!("{CONFIG_FILE_STEM}.");
    let mut environments: Vec<String> = std::fs::read_dir(&dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| {
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".toml"))
                .map(str::to_string)
        })
        .collect();
    environments.sort();

    if environments.is_empty() {
        println!("   (none; only the base file and defaults apply)");
    }
    for environment in environments {
        println!("   - {environment}");
    }
    Ok(())
}
