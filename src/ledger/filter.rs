//! Entity and month-range filtering.

use chrono::{Datelike as _, Utc};

use crate::models::{
    DailyExpense, Invoice, Payment, SalaryExpense, VendorInvoice, VendorPayment, YearMonth,
};

/// A record that can be narrowed by counterparty and month.
pub trait LedgerRecord {
    /// Name of the counterparty (client, vendor, employee or payee).
    fn entity_name(&self) -> Option<&str>;

    /// Month the record belongs to. Month names map to `reference_year`.
    fn year_month(&self, reference_year: i32) -> Option<YearMonth>;
}

impl LedgerRecord for Invoice {
    #[inline]
    fn entity_name(&self) -> Option<&str> {
        Some(self.client_name.as_str())
    }

    #[inline]
    fn year_month(&self, reference_year: i32) -> Option<YearMonth> {
        YearMonth::resolve(self.invoice_date.as_deref(), self.month.as_deref(), reference_year)
    }
}

impl LedgerRecord for Payment {
    #[inline]
    fn entity_name(&self) -> Option<&str> {
        self.resolved_client_name()
    }

    #[inline]
    fn year_month(&self, reference_year: i32) -> Option<YearMonth> {
        YearMonth::resolve(self.payment_date.as_deref(), None, reference_year)
    }
}

impl LedgerRecord for VendorInvoice {
    #[inline]
    fn entity_name(&self) -> Option<&str> {
        Some(self.vendor_name.as_str())
    }

    #[inline]
    fn year_month(&self, reference_year: i32) -> Option<YearMonth> {
        YearMonth::resolve(self.invoice_date.as_deref(), self.month.as_deref(), reference_year)
    }
}

impl LedgerRecord for VendorPayment {
    #[inline]
    fn entity_name(&self) -> Option<&str> {
        self.resolved_vendor_name()
    }

    #[inline]
    fn year_month(&self, reference_year: i32) -> Option<YearMonth> {
        YearMonth::resolve(self.payment_date.as_deref(), None, reference_year)
    }
}

impl LedgerRecord for SalaryExpense {
    #[inline]
    fn entity_name(&self) -> Option<&str> {
        Some(self.employee_name.as_str())
    }

    #[inline]
    fn year_month(&self, reference_year: i32) -> Option<YearMonth> {
        YearMonth::resolve(self.payment_date.as_deref(), self.month.as_deref(), reference_year)
    }
}

impl LedgerRecord for DailyExpense {
    #[inline]
    fn entity_name(&self) -> Option<&str> {
        self.paid_to.as_deref()
    }

    #[inline]
    fn year_month(&self, reference_year: i32) -> Option<YearMonth> {
        YearMonth::resolve(self.date.as_deref(), None, reference_year)
    }
}

/// Composable entity and month-range filter.
///
/// All conditions must hold. Bounds are inclusive; an unset bound is
/// unconstrained.
///
/// # Examples
///
/// ```
/// use fleetledger::ledger::LedgerFilter;
/// use fleetledger::models::YearMonth;
///
/// let filter = LedgerFilter::new()
///     .entity("Acme Logistics")
///     .since(YearMonth::new(2026, 1).unwrap())
///     .until(YearMonth::new(2026, 3).unwrap());
/// assert!(filter.has_month_bounds());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Exact counterparty name; `None` or blank selects all.
    pub entity: Option<String>,
    /// First included month.
    pub from: Option<YearMonth>,
    /// Last included month.
    pub to: Option<YearMonth>,
    /// Year assigned to records labelled with a bare month name.
    pub reference_year: i32,
}

impl Default for LedgerFilter {
    #[inline]
    fn default() -> Self {
        Self {
            entity: None,
            from: None,
            to: None,
            reference_year: Utc::now().year(),
        }
    }
}

impl LedgerFilter {
    /// Creates a filter that matches everything, with the current year as
    /// reference year.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one counterparty.
    #[inline]
    #[must_use]
    pub fn entity<T: Into<String>>(mut self, name: T) -> Self {
        self.entity = Some(name.into());
        self
    }

    /// Sets the first included month.
    #[inline]
    #[must_use]
    pub const fn since(mut self, month: YearMonth) -> Self {
        self.from = Some(month);
        self
    }

    /// Sets the last included month.
    #[inline]
    #[must_use]
    pub const fn until(mut self, month: YearMonth) -> Self {
        self.to = Some(month);
        self
    }

    /// Overrides the reference year for month-name labels.
    #[inline]
    #[must_use]
    pub const fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Returns a copy without the entity restriction.
    #[inline]
    #[must_use]
    pub fn months_only(&self) -> Self {
        Self {
            entity: None,
            ..self.clone()
        }
    }

    /// Returns `true` if either month bound is set.
    #[inline]
    #[must_use]
    pub const fn has_month_bounds(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Returns `true` if the record satisfies every set criterion.
    #[inline]
    pub fn matches<R: LedgerRecord + ?Sized>(&self, record: &R) -> bool {
        self.matches_entity(record) && self.matches_months(record)
    }

    /// Checks the entity criterion.
    fn matches_entity<R: LedgerRecord + ?Sized>(&self, record: &R) -> bool {
        self.entity
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .is_none_or(|name| record.entity_name() == Some(name))
    }

    /// Checks the month-range criterion.
    fn matches_months<R: LedgerRecord + ?Sized>(&self, record: &R) -> bool {
        if !self.has_month_bounds() {
            return true;
        }
        record
            .year_month(self.reference_year)
            .is_some_and(|month| {
                self.from.is_none_or(|from| month >= from) && self.to.is_none_or(|to| month <= to)
            })
    }
}

/// Returns the records matching `filter`, in input order.
#[inline]
#[must_use]
pub fn filter_by_entity_and_month_range<'records, R: LedgerRecord>(
    records: &'records [R],
    filter: &LedgerFilter,
) -> Vec<&'records R> {
    records.iter().filter(|record| filter.matches(*record)).collect()
}
