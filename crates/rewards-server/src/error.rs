//! Error types for the rewards server binary.
//!
//! [`AppError`] is the top-level error type that wraps every failure mode
//! during startup and serving.

use rewards_api::ServerError;

use crate::config::ConfigError;

/// Top-level error for the rewards server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: ServerError,
    },

    /// The server task panicked or was cancelled.
    #[error("server task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
