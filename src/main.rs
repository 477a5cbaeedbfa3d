//! monitor — multi-resolution system statistics, from 60 Hz samples up to
//! a week of history.
//!
//! Run with:  `RUST_LOG=info monitor [path/to/monitor.toml]`

mod report;
mod runtime;

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("monitor v{} starting", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(monitor_config::default_path);
    let config = monitor_config::load(&path)?;

    runtime::run(config).await
}
