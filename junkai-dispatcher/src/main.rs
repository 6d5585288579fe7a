//! Junkai Dispatcher
//!
//! Coordinates one dispatch cycle for one job of the processing pipeline
//! (transcription → feature extraction → aggregation → scoring).
//!
//! Architecture:
//! - Configuration: process settings from the environment, per-job knobs
//!   from the settings document
//! - Registry: static table of job definitions
//! - Repositories: HTTP seams over the record store and job backends
//! - Services: work selection, invocation + classification, cycle
//!   aggregation, execution ledger
//!
//! The external supervisor invokes this binary once per job per cycle;
//! each invocation appends exactly one line to that job's ledger unless
//! the job is disabled or startup fails fatally.

mod clock;
mod config;
mod registry;
mod repository;
mod service;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use junkai_client::StoreClient;
use junkai_core::domain::record::RunStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::registry::JobRegistry;
use crate::repository::{HttpJobBackend, HttpRecordStore, JobBackend, RecordStore};
use crate::service::{BackendInvoker, ExecutionLedger, FileLedger, RunAggregator, WorkSelector};
use crate::settings::SettingsStore;

/// Dispatches one cycle of a pipeline job
#[derive(Parser)]
#[command(name = "junkai-dispatcher")]
struct Cli {
    /// Name of the job to dispatch (e.g. "whisper", "behavior-aggregator")
    job_name: String,

    /// Print the job's ledger summary as JSON instead of dispatching
    #[arg(long)]
    status: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "junkai_dispatcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.status {
        return print_status(&cli.job_name);
    }

    let config = Config::from_env().context("failed to load configuration")?;
    config.validate()?;

    let registry = JobRegistry::builtin();
    let def = registry
        .lookup(&cli.job_name)
        .with_context(|| format!("known jobs: {}", registry.job_names().join(", ")))?;

    let dispatch_settings = SettingsStore::new(&config.settings_path)
        .load()
        .context("failed to load settings document")?;
    let job_settings = dispatch_settings.job(&cli.job_name);

    if !dispatch_settings.global.enabled {
        info!("dispatching globally disabled, skipping cycle");
        return Ok(());
    }
    if !job_settings.enabled {
        info!(job = %def.name, "job disabled, skipping cycle");
        return Ok(());
    }

    let store: Arc<dyn RecordStore> = Arc::new(HttpRecordStore::new(StoreClient::new(
        &config.store_url,
        &config.store_key,
    )));
    let backend: Arc<dyn JobBackend> = Arc::new(HttpJobBackend::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let selector = WorkSelector::new(
        Arc::clone(&store),
        clock,
        config.fallback_device_id.clone(),
    );
    let invoker = BackendInvoker::new(backend, store);
    let aggregator = RunAggregator::new(selector, invoker);

    let record = aggregator.run(def, &job_settings).await;

    let ledger = FileLedger::new(&config.ledger_dir);
    ledger
        .append(&record)
        .context("failed to append execution record")?;

    if record.status == RunStatus::Error {
        warn!(job = %def.name, "cycle ended in ERROR");
        std::process::exit(1);
    }

    Ok(())
}

/// Prints the recomputed ledger summary for a job.
fn print_status(job_name: &str) -> Result<()> {
    let ledger_dir = std::env::var("LEDGER_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/log/junkai"));

    let summary = FileLedger::new(ledger_dir).summarize(job_name)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
