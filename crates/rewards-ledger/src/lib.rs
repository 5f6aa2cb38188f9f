//! Points ledger and oldest-first spend allocation.
//!
//! Every point a holder owns is tracked here as a timestamped entry
//! attributed to the payer that issued it. Points are spent oldest first
//! across all payers, a payer's balance never goes negative, and clawbacks
//! (negative entries) are settled against that payer's earned points before
//! anything is handed to a spend. The ledger never panics; it returns
//! errors.
//!
//! # Architecture
//!
//! - [`store`] -- The [`LedgerStore`] trait and the in-memory [`MemoryStore`]
//!   that owns both entries and the balance projection.
//! - [`entry`] -- The [`EntryBuilder`] for validated entry construction.
//! - [`allocation`] -- The spend pass: a pure function from a snapshot to a
//!   residual entry set and a per-payer summary.
//! - [`verify`] -- Balance projection checks and anomaly detection.
//! - [`ledger`] -- The [`PointsLedger`] facade tying the above together.
//!
//! # Balance Invariant
//!
//! For every payer P after every committed operation:
//!
//! ```text
//! balance(P) == sum(points of P's stored entries) && balance(P) >= 0
//! ```
//!
//! A violation produces a [`BalanceAnomaly`].
//!
//! # Usage
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use rewards_ledger::PointsLedger;
//! use rewards_types::{Entry, Payer};
//!
//! let mut ledger = PointsLedger::in_memory();
//! let t1 = Utc.with_ymd_and_hms(2020, 11, 2, 14, 0, 0).unwrap();
//! let t2 = Utc.with_ymd_and_hms(2020, 11, 2, 15, 0, 0).unwrap();
//!
//! ledger.record_entry(Entry::new("DANNON", 300, t1)).ok();
//! ledger.record_entry(Entry::new("UNILEVER", 200, t2)).ok();
//!
//! let result = ledger.spend(100).ok();
//! assert_eq!(
//!     result.and_then(|r| r.delta_for(&Payer::from("DANNON"))),
//!     Some(-100),
//! );
//! assert_eq!(ledger.balance(&Payer::from("DANNON")), 200);
//! ```

pub mod allocation;
pub mod entry;
pub mod ledger;
pub mod store;
pub mod verify;

// Re-export primary types at crate root.
pub use allocation::{Allocation, allocate};
pub use entry::EntryBuilder;
pub use ledger::PointsLedger;
pub use store::{LedgerStore, MemoryStore};
pub use verify::BalanceCheck;

use std::collections::BTreeMap;

use rewards_types::Payer;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A required field was not provided on a record request.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The payer name was empty or whitespace.
    #[error("payer must not be empty")]
    EmptyPayer,

    /// A spend request asked for a negative amount.
    #[error("spend amount must not be negative, got {points}")]
    NegativeSpend {
        /// The rejected amount.
        points: i64,
    },

    /// Recording the entry would leave the payer with a negative balance.
    #[error("entry would leave payer {payer} with negative balance {balance}")]
    NegativeBalance {
        /// The payer the entry was for.
        payer: Payer,
        /// The balance the entry would have produced.
        balance: i64,
    },

    /// The ledger holds fewer points than the spend requested.
    #[error("insufficient points: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Points the caller asked to spend.
        requested: i64,
        /// Points available across all payers.
        available: i64,
    },

    /// A points sum left the range of `i64`.
    #[error("point arithmetic overflow")]
    Overflow,

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

impl LedgerError {
    /// Returns `true` for errors caused by a malformed request, which are
    /// rejected before the ledger is touched.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::EmptyPayer
                | Self::NegativeSpend { .. }
                | Self::NegativeBalance { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A balance invariant violation found by [`verify`].
///
/// Raised when a payer's projected balance differs from the sum of its
/// stored entries, or when either value is negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAnomaly {
    /// Per-payer (`projected`, `actual`) for every payer that failed.
    pub imbalances: BTreeMap<Payer, (i64, i64)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for BalanceAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
