//! Rewards points ledger server binary.
//!
//! Loads configuration, initializes structured logging, and serves the
//! points API over an in-memory ledger until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `rewards-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Create the shared ledger state
//! 4. Spawn the HTTP API and wait for it to stop

mod config;
mod error;

use std::path::Path;
use std::sync::Arc;

use rewards_api::{AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{CONFIG_PATH, LogFormat, LoggingConfig, RewardsConfig};
use crate::error::AppError;

/// Application entry point for the rewards server.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let config = RewardsConfig::load(config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!("rewards-server starting");

    if config_path.exists() {
        info!(path = CONFIG_PATH, "Configuration loaded");
    } else {
        info!("Config file not found, using defaults");
    }
    info!(
        host = %config.server.host,
        port = config.server.port,
        level = %config.logging.level,
        format = ?config.logging.format,
        "Effective configuration"
    );

    // 3. Create the shared ledger.
    let state = Arc::new(AppState::new());

    // 4. Serve until shutdown.
    let server = ServerConfig::from(&config.server);
    let api_handle = rewards_api::startup::spawn_api(server, state)?;
    api_handle.await.map_err(|e| AppError::Task {
        message: format!("{e}"),
    })??;

    info!("rewards-server stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}
