//! Ledger construction: rows, running balances, filters and summaries.
//!
//! A ledger is built in three steps. Records are narrowed by a
//! [`LedgerFilter`], turned into date-ordered [`LedgerRows`], and walked
//! by [`accumulate`] into a [`LedgerReport`] carrying the running balance
//! of every row.

mod balance;
mod filter;
mod rows;
mod summary;

pub use balance::{BalancedRow, LedgerReport, LedgerTotals, accumulate};
pub use filter::{LedgerFilter, LedgerRecord, filter_by_entity_and_month_range};
pub use rows::{BankSources, LedgerEntry, LedgerRow, LedgerRows, RowKind, build_bank_rows, build_rows};
pub use summary::{ClientBalance, bank_ledger, client_balances, client_ledger, vendor_ledger};

/// The three ledgers and their sign conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    /// Receivables: invoices debit, payments credit. A positive balance is
    /// owed by the client.
    Client,
    /// Payables: vendor invoices credit, vendor payments debit. A positive
    /// balance is owed to the vendor.
    Vendor,
    /// Cash flow: receipts credit, disbursements debit. A positive balance
    /// is cash in hand.
    Bank,
}

impl LedgerKind {
    /// Signed change a row applies to the running balance.
    #[inline]
    #[must_use]
    pub fn movement(self, row: &LedgerRow) -> f64 {
        match self {
            Self::Client => row.debit - row.credit - row.tax_deduction,
            Self::Vendor | Self::Bank => row.credit - row.debit - row.tax_deduction,
        }
    }

    /// Lowercase label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Vendor => "vendor",
            Self::Bank => "bank",
        }
    }
}

impl core::fmt::Display for LedgerKind {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}
