//! Ledger rows and the per-record row builders.

use chrono::NaiveDate;

use super::LedgerKind;
use crate::models::{
    DailyExpense, Invoice, InvoiceNo, Payment, SalaryExpense, VendorInvoice, VendorPayment, epoch_date,
    parse_record_date,
};
use crate::tax;

/// Origin of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// Client invoice.
    Invoice,
    /// Client payment.
    Payment,
    /// Vendor invoice.
    VendorInvoice,
    /// Vendor payment.
    VendorPayment,
    /// Salary disbursement.
    Salary,
    /// Daily expense.
    Expense,
}

impl RowKind {
    /// Human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Payment => "Payment",
            Self::VendorInvoice => "Vendor invoice",
            Self::VendorPayment => "Vendor payment",
            Self::Salary => "Salary",
            Self::Expense => "Expense",
        }
    }
}

impl core::fmt::Display for RowKind {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// One signed entry of a ledger. Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    /// Record the row came from.
    pub kind: RowKind,
    /// Record date, if it parsed.
    pub date: Option<NaiveDate>,
    /// Invoice number or payment reference.
    pub reference: String,
    /// Counterparty and method description.
    pub details: String,
    /// Debit amount.
    pub debit: f64,
    /// Credit amount.
    pub credit: f64,
    /// Tax withheld on this row.
    pub tax_deduction: f64,
}

impl LedgerRow {
    /// Date used for ordering; missing dates sort as the Unix epoch.
    #[inline]
    #[must_use]
    pub fn sort_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(epoch_date)
    }

    /// Creates a row with zero amounts.
    fn new(kind: RowKind, date: Option<&str>, reference: Option<&str>, details: String) -> Self {
        Self {
            kind,
            date: date.and_then(parse_record_date),
            reference: reference.unwrap_or_default().to_owned(),
            details,
            debit: 0.0_f64,
            credit: 0.0_f64,
            tax_deduction: 0.0_f64,
        }
    }
}

/// Rows in ascending date order.
///
/// Ordering is stable: rows sharing a date keep their input order, so
/// invoices precede payments made on the same day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerRows(Vec<LedgerRow>);

impl LedgerRows {
    /// Sorts `rows` by date.
    #[inline]
    #[must_use]
    pub fn from_unsorted(mut rows: Vec<LedgerRow>) -> Self {
        rows.sort_by_key(LedgerRow::sort_date);
        Self(rows)
    }

    /// Returns the rows as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[LedgerRow] {
        &self.0
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the rows in order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, LedgerRow> {
        self.0.iter()
    }
}

impl<'rows> IntoIterator for &'rows LedgerRows {
    type Item = &'rows LedgerRow;
    type IntoIter = core::slice::Iter<'rows, LedgerRow>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A record that contributes one row to a ledger.
pub trait LedgerEntry {
    /// Builds the row this record contributes to `ledger`.
    fn ledger_row(&self, ledger: LedgerKind) -> LedgerRow;
}

impl<T: LedgerEntry + ?Sized> LedgerEntry for &T {
    #[inline]
    fn ledger_row(&self, ledger: LedgerKind) -> LedgerRow {
        (**self).ledger_row(ledger)
    }
}

/// Fallback text for a missing name or method.
const UNSPECIFIED: &str = "unspecified";

impl LedgerEntry for Invoice {
    #[inline]
    fn ledger_row(&self, _ledger: LedgerKind) -> LedgerRow {
        let mut details = format!("Invoice to {}", self.client_name);
        if let Some(month) = self.month.as_deref() {
            details = format!("{details} ({month})");
        }
        let mut row = LedgerRow::new(
            RowKind::Invoice,
            self.invoice_date.as_deref(),
            Some(self.number()),
            details,
        );
        row.debit = self.total_amount;
        row
    }
}

impl LedgerEntry for Payment {
    /// Credits the net amount. Tax withheld counts against the client
    /// balance in the client ledger only; the bank receives the net.
    #[inline]
    fn ledger_row(&self, ledger: LedgerKind) -> LedgerRow {
        let resolved = tax::resolve(self);
        let details = format!(
            "Payment from {} via {}",
            self.resolved_client_name().unwrap_or(UNSPECIFIED),
            self.method.as_deref().unwrap_or(UNSPECIFIED)
        );
        let mut row = LedgerRow::new(
            RowKind::Payment,
            self.payment_date.as_deref(),
            self.reference_label(),
            details,
        );
        row.credit = resolved.net_credit;
        if ledger == LedgerKind::Client {
            row.tax_deduction = resolved.tax_deduction;
        }
        row
    }
}

impl LedgerEntry for VendorInvoice {
    #[inline]
    fn ledger_row(&self, _ledger: LedgerKind) -> LedgerRow {
        let details = match self.description.as_deref() {
            Some(description) => format!("Bill from {}: {description}", self.vendor_name),
            None => format!("Bill from {}", self.vendor_name),
        };
        let reference = self
            .invoice_no
            .as_ref()
            .map(InvoiceNo::as_inner)
            .or(self.id.as_deref());
        let mut row = LedgerRow::new(
            RowKind::VendorInvoice,
            self.invoice_date.as_deref(),
            reference,
            details,
        );
        row.credit = self.total_amount;
        row
    }
}

impl LedgerEntry for VendorPayment {
    #[inline]
    fn ledger_row(&self, ledger: LedgerKind) -> LedgerRow {
        let resolved = tax::resolve(self);
        let details = format!(
            "Payment to {} via {}",
            self.resolved_vendor_name().unwrap_or(UNSPECIFIED),
            self.method.as_deref().unwrap_or(UNSPECIFIED)
        );
        let mut row = LedgerRow::new(
            RowKind::VendorPayment,
            self.payment_date.as_deref(),
            self.reference_label(),
            details,
        );
        row.debit = resolved.net_credit;
        if ledger == LedgerKind::Vendor {
            row.tax_deduction = resolved.tax_deduction;
        }
        row
    }
}

impl LedgerEntry for SalaryExpense {
    #[inline]
    fn ledger_row(&self, _ledger: LedgerKind) -> LedgerRow {
        let details = match self.month.as_deref() {
            Some(month) => format!("Salary: {} ({month})", self.employee_name),
            None => format!("Salary: {}", self.employee_name),
        };
        let mut row = LedgerRow::new(
            RowKind::Salary,
            self.payment_date.as_deref(),
            self.id.as_deref(),
            details,
        );
        row.debit = self.amount;
        row
    }
}

impl LedgerEntry for DailyExpense {
    #[inline]
    fn ledger_row(&self, _ledger: LedgerKind) -> LedgerRow {
        let category = self.category.as_deref().unwrap_or("Expense");
        let details = match (self.description.as_deref(), self.paid_to.as_deref()) {
            (Some(description), Some(paid_to)) => format!("{category}: {description} ({paid_to})"),
            (Some(description), None) => format!("{category}: {description}"),
            (None, Some(paid_to)) => format!("{category}: {paid_to}"),
            (None, None) => category.to_owned(),
        };
        let mut row = LedgerRow::new(RowKind::Expense, self.date.as_deref(), self.id.as_deref(), details);
        row.debit = self.amount;
        row
    }
}

/// Builds date-ordered rows from invoices followed by payments.
#[inline]
#[must_use]
pub fn build_rows<I: LedgerEntry, P: LedgerEntry>(
    invoices: &[I],
    payments: &[P],
    ledger: LedgerKind,
) -> LedgerRows {
    let rows = invoices
        .iter()
        .map(|invoice| invoice.ledger_row(ledger))
        .chain(payments.iter().map(|payment| payment.ledger_row(ledger)))
        .collect();
    LedgerRows::from_unsorted(rows)
}

/// Already-filtered inputs of the bank ledger.
#[derive(Debug, Clone, Default)]
pub struct BankSources<'records> {
    /// Client payments (receipts).
    pub payments: Vec<&'records Payment>,
    /// Vendor payments (disbursements).
    pub vendor_payments: Vec<&'records VendorPayment>,
    /// Salary disbursements.
    pub salary_expenses: Vec<&'records SalaryExpense>,
    /// Daily expenses.
    pub daily_expenses: Vec<&'records DailyExpense>,
}

/// Builds date-ordered bank ledger rows from every cash source.
#[inline]
#[must_use]
pub fn build_bank_rows(sources: &BankSources<'_>) -> LedgerRows {
    let ledger = LedgerKind::Bank;
    let rows = sources
        .payments
        .iter()
        .map(|payment| payment.ledger_row(ledger))
        .chain(sources.vendor_payments.iter().map(|payment| payment.ledger_row(ledger)))
        .chain(sources.salary_expenses.iter().map(|salary| salary.ledger_row(ledger)))
        .chain(sources.daily_expenses.iter().map(|expense| expense.ledger_row(ledger)))
        .collect();
    LedgerRows::from_unsorted(rows)
}
