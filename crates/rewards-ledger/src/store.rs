//! Ledger storage: per-payer entry lists plus the balance projection.
//!
//! The [`LedgerStore`] trait is the only thing the allocation logic knows
//! about storage. [`MemoryStore`] is the in-memory implementation; it owns
//! the entries and the balances in one struct and recomputes a payer's
//! projected balance on every write that touches that payer.
//!
//! # Invariants
//!
//! - Sequence numbers are strictly increasing and never reused.
//! - After any write, `balance(p)` equals the sum of `entries(p)`.
//! - A failed write leaves the store exactly as it was.

use std::collections::BTreeMap;

use rewards_types::{Balances, Entry, Payer, StoredEntry};

use crate::LedgerError;

/// Storage boundary for the points ledger.
///
/// Implementations hold no business rules. The only computation they do is
/// keeping the balance projection equal to the per-payer entry sums.
pub trait LedgerStore {
    /// Entries recorded for `payer`, in arrival order.
    ///
    /// Returns an empty list for an unknown payer.
    fn entries(&self, payer: &Payer) -> Vec<StoredEntry>;

    /// Every stored entry across all payers, in arrival order.
    fn all_entries(&self) -> Vec<StoredEntry>;

    /// Append an entry, assigning it the next sequence number, and
    /// recompute its payer's balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the payer's balance or the
    /// sequence counter would overflow. The store is unchanged.
    fn append(&mut self, entry: Entry) -> Result<StoredEntry, LedgerError>;

    /// Atomically replace every stored entry and rebuild all balances.
    ///
    /// Payers that were known before but have no entries in `entries`
    /// keep a projected balance of zero.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if a payer's sum overflows. The
    /// store is unchanged.
    fn replace_all(&mut self, entries: Vec<StoredEntry>) -> Result<(), LedgerError>;

    /// Projected balance of `payer`, or zero if unknown.
    fn balance(&self, payer: &Payer) -> i64;

    /// Projected balance of every known payer.
    fn balances(&self) -> Balances;

    /// Remove all entries and balances.
    fn clear(&mut self);
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory, `BTreeMap`-based ledger store.
///
/// Not internally synchronized: callers that share it across tasks wrap the
/// owning ledger in a lock.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    /// Entries per payer, each list in arrival order.
    entries: BTreeMap<Payer, Vec<StoredEntry>>,
    /// Balance projection, one value per known payer.
    balances: BTreeMap<Payer, i64>,
    /// Sequence assigned to the next appended entry.
    next_sequence: u64,
}

impl MemoryStore {
    /// Create a new empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            balances: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

/// Sum the points of `entries`, failing on overflow.
pub(crate) fn sum_points<'a>(
    entries: impl IntoIterator<Item = &'a StoredEntry>,
) -> Result<i64, LedgerError> {
    entries.into_iter().try_fold(0_i64, |acc, e| {
        acc.checked_add(e.points()).ok_or(LedgerError::Overflow)
    })
}

impl LedgerStore for MemoryStore {
    fn entries(&self, payer: &Payer) -> Vec<StoredEntry> {
        self.entries.get(payer).cloned().unwrap_or_default()
    }

    fn all_entries(&self) -> Vec<StoredEntry> {
        let mut all: Vec<StoredEntry> = self.entries.values().flatten().cloned().collect();
        all.sort_by_key(|e| e.sequence);
        all
    }

    fn append(&mut self, entry: Entry) -> Result<StoredEntry, LedgerError> {
        let sequence = self.next_sequence;
        let next_sequence = sequence.checked_add(1).ok_or(LedgerError::Overflow)?;
        let balance = self
            .balance(&entry.payer)
            .checked_add(entry.points)
            .ok_or(LedgerError::Overflow)?;

        let stored = StoredEntry::new(sequence, entry);
        let payer = stored.payer().clone();

        self.entries
            .entry(payer.clone())
            .or_default()
            .push(stored.clone());
        self.balances.insert(payer, balance);
        self.next_sequence = next_sequence;

        Ok(stored)
    }

    fn replace_all(&mut self, entries: Vec<StoredEntry>) -> Result<(), LedgerError> {
        let mut next_sequence = self.next_sequence;
        let mut grouped: BTreeMap<Payer, Vec<StoredEntry>> = BTreeMap::new();
        for entry in entries {
            if entry.sequence >= next_sequence {
                next_sequence = entry.sequence.checked_add(1).ok_or(LedgerError::Overflow)?;
            }
            grouped.entry(entry.payer().clone()).or_default().push(entry);
        }

        // Previously known payers stay visible with a zero balance.
        let mut balances: BTreeMap<Payer, i64> =
            self.balances.keys().map(|p| (p.clone(), 0)).collect();
        for (payer, list) in &mut grouped {
            list.sort_by_key(|e| e.sequence);
            balances.insert(payer.clone(), sum_points(list.iter())?);
        }

        self.entries = grouped;
        self.balances = balances;
        self.next_sequence = next_sequence;
        Ok(())
    }

    fn balance(&self, payer: &Payer) -> i64 {
        self.balances.get(payer).copied().unwrap_or(0)
    }

    fn balances(&self) -> Balances {
        self.balances.clone()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.balances.clear();
    }
}
