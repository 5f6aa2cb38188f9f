//! Shared application state for the points API.
//!
//! [`AppState`] holds the one ledger every request operates on. The
//! ledger sits behind a single [`Mutex`]: record, spend and query each
//! hold it for the whole operation, so a spend never observes a half
//! applied record and two spends never interleave.

use std::sync::Arc;

use rewards_ledger::{MemoryStore, PointsLedger};
use tokio::sync::Mutex;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The points ledger served by every endpoint.
    pub ledger: Arc<Mutex<PointsLedger<MemoryStore>>>,
}

impl AppState {
    /// Create a new application state over an empty in-memory ledger.
    pub fn new() -> Self {
        Self::with_ledger(PointsLedger::in_memory())
    }

    /// Create a new application state around an existing ledger.
    pub fn with_ledger(ledger: PointsLedger<MemoryStore>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
