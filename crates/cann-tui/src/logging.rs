use anyhow::{anyhow, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "cann=info,cann_core=info";

/// Send tracing output to `<data dir>/cann-assistant/logs/cann.log`.
///
/// The terminal belongs to the UI, so nothing is ever written to stdout/stderr.
/// `RUST_LOG` overrides the default filter.
pub fn init() -> Result<PathBuf> {
    let log_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("cann-assistant")
        .join("logs");
    fs::create_dir_all(&log_dir)?;

    let log_path = log_dir.join("cann.log");
    let file = OpenOptions::new().append(true).create(true).open(&log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::info!("Logging initialized to: {:?}", log_path);
    Ok(log_path)
}
