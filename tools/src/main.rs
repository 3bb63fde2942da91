//! suspicion-service: serves precomputed suspicion scores over HTTP.
//!
//! Usage:
//!   suspicion-service --config config.toml
//!
//! Startup is all-or-nothing: configuration, log file, database load and
//! the pipeline must all succeed before the listener is bound.

mod logging;

use anyhow::Result;
use std::env;
use std::sync::Arc;
use suspicion_core::{
    api::{self, AppState},
    config::{ServiceConfig, DEFAULT_CONFIG_PATH},
    error::ServiceResult,
    pipeline::Pipeline,
    snapshot::Snapshot,
    store::ResultStore,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str())
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = ServiceConfig::load(config_path)?;
    let log_path = logging::init(&config.logging)?;
    log::info!("Starting the service; loaded configuration file: {config_path}");

    let addr = config.bind_addr()?;
    let snapshot = build_snapshot(&config).inspect_err(|e| log::error!("startup failed: {e}"))?;

    println!("suspicion-service");
    println!("  db:       {}", config.store.path);
    println!("  table:    {}", config.store.table);
    println!("  records:  {}", snapshot.len());
    println!("  log file: {}", log_path.display());
    println!("  listen:   http://{addr}");

    let state = AppState::new(Arc::new(snapshot), config.pipeline.head_limit);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime
        .block_on(api::serve(addr, state))
        .inspect_err(|e| log::error!("Error starting the server: {e}"))?;
    Ok(())
}

/// Load the result table once and run it through the pipeline. The store
/// connection is closed before this returns.
fn build_snapshot(config: &ServiceConfig) -> ServiceResult<Snapshot> {
    let table = ResultStore::open(&config.store.path)?.load_table(&config.store.table)?;
    log::info!("Data loaded from SQLite database.");

    let pipeline = Pipeline::standard(&config.pipeline, &table)?;
    let (snapshot, report) = pipeline.run(table)?;
    log::info!(
        "Snapshot ready: {} rows, {} -> {} bytes ({} saved, {:.1}% reduction)",
        report.rows,
        report.memory.before_bytes,
        report.memory.after_bytes,
        report.memory.saved_bytes(),
        report.memory.reduction_pct()
    );
    Ok(snapshot)
}
