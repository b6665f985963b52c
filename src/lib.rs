pub mod db;
pub mod detection;
pub mod error;
pub mod ingest;
pub mod query;
pub mod settings;
mod utils;

use std::{io::Read, path::PathBuf};

use anyhow::{bail, Context};
use db::Database;
use ingest::{IngestPipeline, IngestRequest};
use settings::SettingsStore;

pub use error::{IngestError, StoreError};

const DEFAULT_DB_PATH: &str = "glucoflow.sqlite3";
const DEFAULT_SETTINGS_PATH: &str = "settings.json";

/// Ingest one JSON batch (file path argument, or `-` for stdin) and print the
/// result summary as JSON.
///
/// Environment: `GLUCOFLOW_DB`, `GLUCOFLOW_SETTINGS`, `RUST_LOG`.
pub fn run() -> anyhow::Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let source = match std::env::args().nth(1) {
        Some(source) => source,
        None => bail!("usage: glucoflow <batch.json | ->"),
    };

    let payload = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read batch from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&source)
            .with_context(|| format!("failed to read batch from {source}"))?
    };
    let request: IngestRequest =
        serde_json::from_str(&payload).context("failed to parse ingestion request")?;

    let db_path = env_path("GLUCOFLOW_DB", DEFAULT_DB_PATH);
    let settings_path = env_path("GLUCOFLOW_SETTINGS", DEFAULT_SETTINGS_PATH);

    let settings = SettingsStore::new(settings_path)?;
    let database = Database::new(db_path)?;
    let pipeline = IngestPipeline::new(database, settings.thresholds());

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(pipeline.ingest(&request))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var_os(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
