//! Shared type definitions for the rewards points ledger.
//!
//! This crate is the single source of truth for the values exchanged
//! between the ledger core and its transport. It carries no logic beyond
//! small accessors.
//!
//! # Modules
//!
//! - [`ids`] -- The [`Payer`] identifier
//! - [`structs`] -- Entries, spend request/result and balances

pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use ids::Payer;
pub use structs::{
    Balances, Entry, PayerDelta, RecordRequest, SpendRequest, SpendResult, StoredEntry,
    parse_timestamp,
};
