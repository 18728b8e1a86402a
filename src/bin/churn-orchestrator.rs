//! # Churn Scoring Orchestrator
//!
//! Registers the scoring job, starts one execution and waits for it,
//! printing the terminal state (and the remote error message on failure).
//! Exits 0 whenever the execution reached a terminal state, non-zero when
//! the driver itself failed or gave up polling.

use anyhow::{Context, Result};
use churn_scoring::backend::LocalExecutionBackend;
use churn_scoring::config::ConfigManager;
use churn_scoring::logging::init_structured_logging;
use churn_scoring::orchestration::{stage_job_script, JobOrchestrator};
use churn_scoring::storage::LocalObjectStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "churn-orchestrator")]
#[command(about = "Create, run and monitor the churn scoring job")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Environment whose configuration overrides apply (default: CHURN_ENV or development)
    #[arg(short, long)]
    environment: Option<String>,

    /// Configuration directory path (default: ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Upload this job script to the configured script location first
    #[arg(long)]
    script: Option<PathBuf>,

    /// Override the maximum polling wait in seconds (0 waits without bound)
    #[arg(long)]
    max_wait_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let environment = cli
        .environment
        .clone()
        .unwrap_or_else(ConfigManager::detect_environment);
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &environment)
        .context("loading configuration")?;

    init_structured_logging();
    let config = manager.config();

    let store = Arc::new(LocalObjectStore::new(&config.storage.root));

    if let Some(script) = &cli.script {
        let contents = std::fs::read(script)
            .with_context(|| format!("reading job script {}", script.display()))?;
        stage_job_script(store.as_ref(), &config.job.script_location(), &contents)
            .context("staging job script")?;
        println!("Uploaded job script to {}", config.job.script_location());
    }

    let backend = Arc::new(LocalExecutionBackend::new(store));
    let mut orchestrator = JobOrchestrator::from_config(backend.clone(), backend, config);

    if let Some(seconds) = cli.max_wait_seconds {
        let policy = orchestrator
            .policy()
            .with_max_wait((seconds > 0).then(|| Duration::from_secs(seconds)));
        orchestrator = orchestrator.with_policy(policy);
    }

    info!(
        environment = %manager.environment(),
        job_name = %orchestrator.job_name(),
        "Starting orchestrated run"
    );

    let report = orchestrator.run().await?;
    println!("{report}");

    std::process::exit(report.exit_code());
}
