//! The points ledger facade.
//!
//! [`PointsLedger`] owns a [`LedgerStore`] and exposes the three operations
//! the outside world needs: record an entry, spend points, and read
//! balances. Every mutation validates first, computes against a snapshot,
//! and only then writes, so a failed call leaves the store untouched.
//!
//! # Design
//!
//! - **Injected store**: the ledger is generic over its store and receives
//!   it by value at construction. There is no global state.
//! - **Single writer**: methods that mutate take `&mut self`. Callers that
//!   share a ledger wrap it in one lock, which serializes record and spend.
//! - **Checked**: after every commit the balance invariant is re-verified.

use rewards_types::{Balances, Entry, Payer, RecordRequest, SpendResult, StoredEntry};
use tracing::{debug, error, info};

use crate::allocation::allocate;
use crate::entry::EntryBuilder;
use crate::store::{LedgerStore, MemoryStore};
use crate::verify::{BalanceCheck, verify_store};
use crate::LedgerError;

/// Points ledger over an injected store.
#[derive(Debug, Default)]
pub struct PointsLedger<S = MemoryStore> {
    store: S,
}

impl PointsLedger<MemoryStore> {
    /// Create a ledger over a fresh [`MemoryStore`].
    pub const fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: LedgerStore> PointsLedger<S> {
    /// Create a ledger over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the ledger and return its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Validate a record request and append it.
    ///
    /// Returns the payer's entries after the append.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] or [`LedgerError::EmptyPayer`]
    /// for a malformed request, and anything [`record_entry`] returns.
    ///
    /// [`record_entry`]: PointsLedger::record_entry
    pub fn record(&mut self, request: RecordRequest) -> Result<Vec<StoredEntry>, LedgerError> {
        let entry = EntryBuilder::from(request).build()?;
        self.record_entry(entry)
    }

    /// Append an already-typed entry.
    ///
    /// Returns the payer's entries after the append. Entries are checked
    /// in arrival order, so a clawback must arrive after the points it
    /// reduces, whatever its timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EmptyPayer`] for a blank payer,
    /// [`LedgerError::NegativeBalance`] if the entry would leave its payer
    /// below zero, and [`LedgerError::Overflow`] if the balance would
    /// overflow.
    pub fn record_entry(&mut self, entry: Entry) -> Result<Vec<StoredEntry>, LedgerError> {
        if entry.payer.is_blank() {
            return Err(LedgerError::EmptyPayer);
        }

        let balance = self
            .store
            .balance(&entry.payer)
            .checked_add(entry.points)
            .ok_or(LedgerError::Overflow)?;
        if balance < 0 {
            return Err(LedgerError::NegativeBalance {
                payer: entry.payer,
                balance,
            });
        }

        let stored = self.store.append(entry)?;
        info!(
            payer = %stored.payer(),
            points = stored.points(),
            sequence = stored.sequence,
            balance,
            "Entry recorded"
        );
        self.check_invariant();

        Ok(self.store.entries(stored.payer()))
    }

    /// Spend `points` across all payers, oldest entries first.
    ///
    /// A spend of zero succeeds with an empty result and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NegativeSpend`] for a negative amount and
    /// [`LedgerError::InsufficientFunds`] if the ledger holds fewer points.
    /// The store is unchanged on any error.
    pub fn spend(&mut self, points: i64) -> Result<SpendResult, LedgerError> {
        if points < 0 {
            return Err(LedgerError::NegativeSpend { points });
        }
        if points == 0 {
            debug!("Zero-point spend, nothing to do");
            return Ok(SpendResult::default());
        }

        let allocation = allocate(self.store.all_entries(), points)?;
        self.store.replace_all(allocation.residual)?;

        info!(
            points,
            payers_charged = allocation.result.len(),
            "Spend committed"
        );
        self.check_invariant();

        Ok(allocation.result)
    }

    /// Current balance of every known payer.
    pub fn balances(&self) -> Balances {
        self.store.balances()
    }

    /// Current balance of `payer`, zero if unknown.
    pub fn balance(&self, payer: &Payer) -> i64 {
        self.store.balance(payer)
    }

    /// Entries held for `payer`, in arrival order.
    pub fn entries(&self, payer: &Payer) -> Vec<StoredEntry> {
        self.store.entries(payer)
    }

    /// Every held entry in spend order: by timestamp, then arrival.
    pub fn all_entries(&self) -> Vec<StoredEntry> {
        let mut entries = self.store.all_entries();
        entries.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then(a.sequence.cmp(&b.sequence))
        });
        entries
    }

    /// Total points held across all payers.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Overflow`] if the total does not fit an `i64`.
    pub fn total_points(&self) -> Result<i64, LedgerError> {
        self.store
            .balances()
            .values()
            .try_fold(0_i64, |acc, b| acc.checked_add(*b))
            .ok_or(LedgerError::Overflow)
    }

    /// Verify the balance invariant over the whole store.
    pub fn verify(&self) -> BalanceCheck {
        verify_store(&self.store)
    }

    /// Log an anomaly if the store's projection drifted from its entries.
    fn check_invariant(&self) {
        if let BalanceCheck::Anomaly(anomaly) = self.verify() {
            error!(
                payers = anomaly.imbalances.len(),
                message = %anomaly,
                "Balance invariant violated"
            );
        }
    }
}
