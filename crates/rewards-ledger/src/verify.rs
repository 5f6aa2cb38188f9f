//! Balance invariant verification.
//!
//! The store keeps a balance projection next to the raw entries. These
//! checks recompute every payer's entry sum and compare it with the
//! projection:
//!
//! ```text
//! projected(P) == sum(entries of P)  &&  projected(P) >= 0
//! ```
//!
//! Both hold by construction for [`MemoryStore`](crate::MemoryStore); the
//! ledger still runs the check after every commit and reports a
//! [`BalanceAnomaly`] if it ever fails.

use std::collections::{BTreeMap, BTreeSet};

use rewards_types::{Balances, Payer, StoredEntry};

use crate::BalanceAnomaly;
use crate::store::LedgerStore;

/// The result of a balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    /// Every projection matches its entries and none is negative.
    Consistent,
    /// At least one payer failed the check.
    Anomaly(BalanceAnomaly),
}

impl BalanceCheck {
    /// Returns `true` for [`BalanceCheck::Consistent`].
    pub const fn is_consistent(&self) -> bool {
        matches!(self, Self::Consistent)
    }
}

/// Check a store's projection against its own entries.
pub fn verify_store<S: LedgerStore + ?Sized>(store: &S) -> BalanceCheck {
    verify_balances(&store.all_entries(), &store.balances())
}

/// Check `balances` against the per-payer sums of `entries`.
///
/// A payer present on either side only is compared against zero on the
/// other. Overflow while summing counts as a failure for that payer.
pub fn verify_balances(entries: &[StoredEntry], balances: &Balances) -> BalanceCheck {
    let mut actual: BTreeMap<&Payer, Option<i64>> = BTreeMap::new();
    for entry in entries {
        let sum = actual.entry(entry.payer()).or_insert(Some(0));
        *sum = sum.and_then(|s| s.checked_add(entry.points()));
    }

    let payers: BTreeSet<&Payer> = actual.keys().copied().chain(balances.keys()).collect();

    let mut imbalances: BTreeMap<Payer, (i64, i64)> = BTreeMap::new();
    for payer in payers {
        let projected = balances.get(payer).copied().unwrap_or(0);
        match actual.get(payer).copied().unwrap_or(Some(0)) {
            Some(sum) if sum == projected && sum >= 0 => {}
            Some(sum) => {
                imbalances.insert(payer.clone(), (projected, sum));
            }
            None => {
                imbalances.insert(payer.clone(), (projected, i64::MAX));
            }
        }
    }

    if imbalances.is_empty() {
        BalanceCheck::Consistent
    } else {
        let count = imbalances.len();
        BalanceCheck::Anomaly(BalanceAnomaly {
            imbalances,
            message: format!("BALANCE_ANOMALY: balance invariant violated for {count} payer(s)"),
        })
    }
}
