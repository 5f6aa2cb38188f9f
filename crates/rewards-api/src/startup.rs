//! Background startup helper for the points API.
//!
//! Provides [`spawn_api`] which launches the HTTP server on a background
//! Tokio task. The binary awaits the returned handle for the server's
//! final result.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError, start_server};
use crate::state::AppState;

/// Spawn the points API server on a background Tokio task.
///
/// The address is validated before the task is spawned, so an obviously
/// bad configuration fails here instead of inside the task. Bind and
/// serve failures after that come back through the handle.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if `config` does not form a valid
/// socket address.
pub fn spawn_api(
    config: ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<Result<(), ServerError>>, ServerError> {
    let addr = config.socket_addr()?;

    let handle = tokio::spawn(async move {
        let result = start_server(&config, state).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Points API exited with error");
        }
        result
    });

    tracing::info!(%addr, "Points API spawned on background task");

    Ok(handle)
}
