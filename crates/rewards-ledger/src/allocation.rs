//! The spend pass: oldest-first allocation over a ledger snapshot.
//!
//! [`allocate`] is a pure function. It takes every stored entry, decides
//! for each one whether it is kept, removed, or replaced by a smaller
//! remainder, and returns the residual entry set together with the
//! per-payer summary. Nothing is written; the caller commits the residual
//! only if the pass succeeds.
//!
//! # Rules
//!
//! 1. Entries are walked by `(timestamp, sequence)`, so equal timestamps
//!    fall back to arrival order.
//! 2. A payer's clawbacks form a debt that is settled out of that payer's
//!    earnings, oldest first, before any of those earnings can be spent.
//!    Clawback entries themselves are always removed.
//! 3. An earning contributes `min(points - settled debt, still owed)`.
//!    Because debts are settled first, no payer can give more than its
//!    balance, and no payer is left negative.

use std::collections::BTreeMap;

use rewards_types::{Payer, PayerDelta, SpendResult, StoredEntry};

use crate::LedgerError;
use crate::store::sum_points;

/// What the spend pass decided for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// Untouched; carried into the residual as is.
    Kept,
    /// Fully consumed (or a settled clawback); dropped from the residual.
    Removed,
    /// Partly consumed; the remainder carries this many points.
    Replaced(i64),
}

/// Outcome of a successful spend pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Entries that survive the spend, in walk order.
    pub residual: Vec<StoredEntry>,
    /// Per-payer deductions, in first-contribution order.
    pub result: SpendResult,
}

/// Run the spend pass for `amount` points over `snapshot`.
///
/// `snapshot` must hold every stored entry of the ledger. An `amount` of
/// zero yields an empty result and hands the snapshot back untouched.
///
/// # Errors
///
/// Returns [`LedgerError::NegativeSpend`] if `amount` is negative,
/// [`LedgerError::InsufficientFunds`] if the snapshot holds fewer usable
/// points than `amount`, and [`LedgerError::Overflow`] if a points sum
/// leaves the range of `i64`.
pub fn allocate(mut snapshot: Vec<StoredEntry>, amount: i64) -> Result<Allocation, LedgerError> {
    if amount < 0 {
        return Err(LedgerError::NegativeSpend { points: amount });
    }
    if amount == 0 {
        return Ok(Allocation {
            residual: snapshot,
            result: SpendResult::default(),
        });
    }

    // Stable ordering: timestamp first, arrival order second.
    snapshot.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then(a.sequence.cmp(&b.sequence))
    });

    let available = sum_points(snapshot.iter())?;
    if available < amount {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available,
        });
    }

    let mut debts = clawback_debts(&snapshot)?;
    let mut remaining = amount;
    let mut spent: Vec<(Payer, i64)> = Vec::new();
    let mut dispositions: Vec<Disposition> = Vec::with_capacity(snapshot.len());
    let mut scanned: usize = 0;

    for entry in &snapshot {
        if entry.entry.is_clawback() {
            // Already counted in the payer's debt.
            dispositions.push(Disposition::Removed);
            continue;
        }
        if remaining == 0 && debts.values().all(|d| *d == 0) {
            dispositions.push(Disposition::Kept);
            continue;
        }
        scanned = scanned.saturating_add(1);

        let points = entry.points();
        let absorbed = match debts.get_mut(entry.payer()) {
            Some(debt) => {
                let absorbed = points.min(*debt);
                *debt = debt.saturating_sub(absorbed);
                absorbed
            }
            None => 0,
        };

        let usable = points.saturating_sub(absorbed).min(remaining);
        remaining = remaining.saturating_sub(usable);
        if usable > 0 {
            add_spent(&mut spent, entry.payer(), usable)?;
        }

        let leftover = points.saturating_sub(absorbed).saturating_sub(usable);
        let disposition = if leftover == points {
            Disposition::Kept
        } else if leftover == 0 {
            Disposition::Removed
        } else {
            Disposition::Replaced(leftover)
        };
        dispositions.push(disposition);
    }

    if remaining > 0 {
        return Err(LedgerError::InsufficientFunds {
            requested: amount,
            available: amount.saturating_sub(remaining),
        });
    }
    if debts.values().any(|d| *d > 0) {
        return Err(LedgerError::InternalError(
            "clawback exceeds payer earnings",
        ));
    }

    tracing::debug!(
        entries = snapshot.len(),
        scanned,
        payers_charged = spent.len(),
        "Spend allocation computed"
    );

    let residual = snapshot
        .iter()
        .zip(dispositions)
        .filter_map(|(entry, disposition)| match disposition {
            Disposition::Kept => Some(entry.clone()),
            Disposition::Removed => None,
            Disposition::Replaced(points) => Some(entry.with_points(points)),
        })
        .collect();

    let deductions = spent
        .into_iter()
        .map(|(payer, used)| {
            used.checked_neg()
                .map(|points| PayerDelta { payer, points })
                .ok_or(LedgerError::Overflow)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Allocation {
        residual,
        result: SpendResult::new(deductions),
    })
}

/// Total clawback amount per payer, as positive numbers.
fn clawback_debts(entries: &[StoredEntry]) -> Result<BTreeMap<Payer, i64>, LedgerError> {
    let mut debts: BTreeMap<Payer, i64> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.entry.is_clawback()) {
        let owed = entry.points().checked_neg().ok_or(LedgerError::Overflow)?;
        let debt = debts.entry(entry.payer().clone()).or_insert(0);
        *debt = debt.checked_add(owed).ok_or(LedgerError::Overflow)?;
    }
    Ok(debts)
}

/// Add `used` to `payer`'s running total, appending the payer on its first
/// contribution.
fn add_spent(spent: &mut Vec<(Payer, i64)>, payer: &Payer, used: i64) -> Result<(), LedgerError> {
    if let Some((_, total)) = spent.iter_mut().find(|(p, _)| p == payer) {
        *total = total.checked_add(used).ok_or(LedgerError::Overflow)?;
    } else {
        spent.push((payer.clone(), used));
    }
    Ok(())
}
