//! Running-balance accumulation.

use super::{LedgerKind, LedgerRow, LedgerRows};

/// A ledger row with the running balance after it.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedRow {
    /// The row.
    pub row: LedgerRow,
    /// Balance after applying the row.
    pub balance: f64,
}

/// Column sums of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LedgerTotals {
    /// Sum of debits.
    pub debit: f64,
    /// Sum of credits.
    pub credit: f64,
    /// Sum of tax deductions.
    pub tax: f64,
    /// Final running balance.
    pub balance: f64,
}

/// A fully accumulated ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReport {
    /// Ledger the sign convention was taken from.
    pub kind: LedgerKind,
    /// Rows with running balances, in date order.
    pub rows: Vec<BalancedRow>,
    /// Column sums and final balance.
    pub totals: LedgerTotals,
}

/// Walks `rows` left to right, computing the running balance with the
/// sign convention of `kind`.
#[inline]
#[must_use]
pub fn accumulate(rows: &LedgerRows, kind: LedgerKind) -> LedgerReport {
    let mut totals = LedgerTotals::default();
    let balanced = rows
        .iter()
        .map(|row| {
            totals.debit += row.debit;
            totals.credit += row.credit;
            totals.tax += row.tax_deduction;
            totals.balance += kind.movement(row);
            BalancedRow {
                row: row.clone(),
                balance: totals.balance,
            }
        })
        .collect();
    LedgerReport {
        kind,
        rows: balanced,
        totals,
    }
}
