//! HTTP API for the rewards points ledger.
//!
//! This crate wraps a single shared [`PointsLedger`] in an Axum server
//! that exposes:
//!
//! - **Record** (`POST /transactions`) -- append a payer entry
//! - **Spend** (`POST /points`) -- spend points oldest first
//! - **Query** (`GET /balances`, `GET /transactions`) -- read balances and
//!   the chronological entry list
//! - **Health** (`GET /health`) -- liveness probe
//!
//! # Architecture
//!
//! Every handler locks the ledger for the whole operation, so record and
//! spend never interleave. Ledger errors are mapped onto HTTP status codes
//! by [`ApiError`](error::ApiError) and returned as JSON.
//!
//! [`PointsLedger`]: rewards_ledger::PointsLedger

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::spawn_api;
pub use state::AppState;
