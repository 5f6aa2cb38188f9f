//! Core value types for the points ledger.
//!
//! Covers the recorded [`Entry`], its stored form [`StoredEntry`], the
//! spend request/result pair and the balance projection.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::Payer;

/// Current balance per payer, in payer name order.
pub type Balances = BTreeMap<Payer, i64>;

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// One timestamped points event attributed to a payer.
///
/// Positive `points` are earned points. Negative `points` are a clawback
/// that removes earned, unspent points from the same payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The sponsor the points belong to.
    pub payer: Payer,
    /// Signed points delta.
    pub points: i64,
    /// When the points were earned (or clawed back).
    pub timestamp: DateTime<Utc>,
}

impl Entry {
    /// Create an entry.
    pub fn new(payer: impl Into<Payer>, points: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            payer: payer.into(),
            points,
            timestamp,
        }
    }

    /// Returns `true` for a negative (clawback) entry.
    pub const fn is_clawback(&self) -> bool {
        self.points < 0
    }
}

/// An [`Entry`] as held by a ledger store.
///
/// `sequence` is assigned by the store on append and never reused. It
/// breaks ties between entries with equal timestamps, so a remainder
/// left behind by a spend keeps the sequence of the entry it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    /// Arrival order across all payers.
    pub sequence: u64,
    /// The recorded event.
    #[serde(flatten)]
    pub entry: Entry,
}

impl StoredEntry {
    /// Pair an entry with its arrival sequence.
    pub const fn new(sequence: u64, entry: Entry) -> Self {
        Self { sequence, entry }
    }

    /// The payer this entry belongs to.
    pub const fn payer(&self) -> &Payer {
        &self.entry.payer
    }

    /// Signed points delta.
    pub const fn points(&self) -> i64 {
        self.entry.points
    }

    /// Event time.
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.entry.timestamp
    }

    /// Copy of this entry carrying a different point amount.
    ///
    /// Payer, timestamp and sequence are preserved.
    #[must_use]
    pub fn with_points(&self, points: i64) -> Self {
        Self {
            sequence: self.sequence,
            entry: Entry {
                payer: self.entry.payer.clone(),
                points,
                timestamp: self.entry.timestamp,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Record request
// ---------------------------------------------------------------------------

/// Unvalidated body of a record-transaction call.
///
/// Every field is optional so that a missing field surfaces as a ledger
/// validation error naming the field, not as a generic parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    /// Sponsor name.
    pub payer: Option<Payer>,
    /// Signed points delta.
    pub points: Option<i64>,
    /// Event time: RFC 3339, or a zoneless date-time read as UTC.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Parse an event time.
///
/// Accepts RFC 3339 (`2020-11-02T14:00:00Z`, any offset) and a zoneless
/// `2020-11-02T14:00:00`, which is taken to be UTC.
///
/// # Errors
///
/// Returns the zoneless parse error if neither form matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| raw.parse::<NaiveDateTime>().map(|t| t.and_utc()))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

impl From<Entry> for RecordRequest {
    fn from(entry: Entry) -> Self {
        Self {
            payer: Some(entry.payer),
            points: Some(entry.points),
            timestamp: Some(entry.timestamp),
        }
    }
}

// ---------------------------------------------------------------------------
// Spend
// ---------------------------------------------------------------------------

/// Body of a spend call: the total to deduct across all payers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendRequest {
    /// Points to spend.
    pub points: i64,
}

/// Points deducted from one payer by a spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerDelta {
    /// The payer charged.
    pub payer: Payer,
    /// Negative delta (e.g. `-100` when 100 points were used).
    pub points: i64,
}

/// Per-payer summary of a committed spend.
///
/// Only payers that contributed at least one point are listed, in the
/// order they first contributed. Serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpendResult {
    deductions: Vec<PayerDelta>,
}

impl SpendResult {
    /// Build a result from deltas already in contribution order.
    pub const fn new(deductions: Vec<PayerDelta>) -> Self {
        Self { deductions }
    }

    /// All deductions, in contribution order.
    pub fn deductions(&self) -> &[PayerDelta] {
        &self.deductions
    }

    /// The (negative) delta charged to `payer`, if it contributed.
    pub fn delta_for(&self, payer: &Payer) -> Option<i64> {
        self.deductions
            .iter()
            .find(|d| &d.payer == payer)
            .map(|d| d.points)
    }

    /// Number of payers charged.
    pub fn len(&self) -> usize {
        self.deductions.len()
    }

    /// Returns `true` if no payer was charged.
    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty()
    }

    /// Total points spent, as a positive number.
    pub fn total_spent(&self) -> i64 {
        self.deductions
            .iter()
            .fold(0_i64, |acc, d| acc.saturating_sub(d.points))
    }
}
