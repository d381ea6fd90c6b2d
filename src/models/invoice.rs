//! Invoice model and its payment-status state machine.

use serde::{Deserialize, Serialize};

use super::{InvoiceNo, loose};
use crate::error::{LedgerError, Result};

/// Slack allowed when comparing amounts accumulated from floating-point
/// arithmetic.
pub(crate) const AMOUNT_TOLERANCE: f64 = 1e-6;

/// Payment status of an invoice.
///
/// Statuses only move forward: `Pending → Partial → Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Nothing has been paid.
    #[default]
    Pending,
    /// Part of the total has been paid.
    Partial,
    /// Fully settled.
    Paid,
}

impl InvoiceStatus {
    /// Derives the status from an invoice's outstanding balance and paid
    /// amount.
    #[inline]
    #[must_use]
    pub fn for_amounts(balance: f64, paid_amount: f64) -> Self {
        if balance <= AMOUNT_TOLERANCE {
            Self::Paid
        } else if paid_amount > AMOUNT_TOLERANCE {
            Self::Partial
        } else {
            Self::Pending
        }
    }
}

impl core::fmt::Display for InvoiceStatus {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match *self {
            Self::Pending => "Pending",
            Self::Partial => "Partial",
            Self::Paid => "Paid",
        };
        f.write_str(label)
    }
}

/// One billed line of an invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    /// Line description (usually the vehicle and service period).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Billed quantity.
    #[serde(default, deserialize_with = "loose::amount")]
    pub quantity: f64,
    /// Price per unit.
    #[serde(default, deserialize_with = "loose::amount")]
    pub unit_price: f64,
    /// Line total.
    #[serde(default, deserialize_with = "loose::amount")]
    pub amount: f64,
}

/// A receivable issued to a client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Invoice number, the natural key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_no: Option<InvoiceNo>,
    /// Client business identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Client display name.
    #[serde(default)]
    pub client_name: String,
    /// Issue date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    /// Due date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Billing month label (`"February"` or `"2026-02"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// Payment status. Unknown labels read as `Pending`; the status is
    /// re-derived from the amounts before any allocation.
    #[serde(default, deserialize_with = "loose::status")]
    pub status: InvoiceStatus,
    /// Amount before tax.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,
    /// Tax charged on the invoice.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    /// Amount due in total.
    #[serde(default, deserialize_with = "loose::amount")]
    pub total_amount: f64,
    /// Amount allocated from payments so far.
    #[serde(default, deserialize_with = "loose::amount")]
    pub paid_amount: f64,
    /// Outstanding balance; derived from total and paid when absent.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    /// Billed lines.
    #[serde(default, deserialize_with = "loose::list")]
    pub items: Vec<InvoiceItem>,
    /// Invoice type label (e.g. `"tracking"`, `"installation"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_type: Option<String>,
}

/// Result of a successful allocation against an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Invoice the allocation was applied to.
    pub invoice_no: InvoiceNo,
    /// Allocated amount.
    pub amount: f64,
    /// Status before the allocation.
    pub from: InvoiceStatus,
    /// Status after the allocation.
    pub to: InvoiceStatus,
    /// Paid amount after the allocation.
    pub paid_amount: f64,
    /// Outstanding balance after the allocation.
    pub balance: f64,
}

impl Invoice {
    /// Returns the outstanding balance.
    ///
    /// Derived from `total - paid`. A stored `balance` only lowers the
    /// result, so a stale balance left by an older front-end can never
    /// admit more than the amounts allow.
    #[inline]
    #[must_use]
    pub fn outstanding(&self) -> f64 {
        let derived = self.total_amount - self.paid_amount;
        self.balance
            .filter(|stored| stored.is_finite())
            .map_or(derived, |stored| stored.min(derived))
    }

    /// Rewrites `balance` and `status` from the amounts.
    ///
    /// A stored balance below `total - paid` is taken as evidence of
    /// payments the paid amount missed, and `paid_amount` is raised to
    /// match. Afterwards `balance == total - paid` holds.
    #[inline]
    pub fn normalize(&mut self) {
        let outstanding = self.outstanding();
        let derived = self.total_amount - self.paid_amount;
        if outstanding < derived - AMOUNT_TOLERANCE {
            self.paid_amount = self.total_amount - outstanding;
        }
        let balance = self.total_amount - self.paid_amount;
        self.balance = Some(balance);
        self.status = InvoiceStatus::for_amounts(balance, self.paid_amount);
    }

    /// Returns the invoice number as a string, or an empty string.
    #[inline]
    #[must_use]
    pub fn number(&self) -> &str {
        self.invoice_no.as_ref().map_or("", InvoiceNo::as_inner)
    }

    /// Checks that `amount` may be allocated without mutating the invoice.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] if the amount is not a positive
    /// finite number or exceeds the outstanding balance.
    #[inline]
    pub fn check_allocation(&self, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount <= 0.0_f64 {
            return Err(LedgerError::Validation(format!(
                "allocation to invoice {} must be a positive amount, got {amount}",
                self.number()
            )));
        }
        let outstanding = self.outstanding();
        if amount > outstanding + AMOUNT_TOLERANCE {
            return Err(LedgerError::Validation(format!(
                "allocation {amount:.2} exceeds balance {outstanding:.2} of invoice {}",
                self.number()
            )));
        }
        Ok(())
    }

    /// Allocates `amount` of a payment to this invoice.
    ///
    /// Increases the paid amount, recomputes the balance as
    /// `total - paid`, and derives the new status.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] (leaving the invoice untouched)
    /// if the allocation is not positive or exceeds the balance.
    #[inline]
    pub fn allocate(&mut self, amount: f64) -> Result<Transition> {
        self.check_allocation(amount)?;
        let from = self.status;
        self.paid_amount += amount;
        let balance = self.total_amount - self.paid_amount;
        self.balance = Some(balance);
        self.status = InvoiceStatus::for_amounts(balance, self.paid_amount);
        tracing::debug!(
            invoice = %self.number(),
            amount,
            from = %from,
            to = %self.status,
            "allocation applied"
        );
        Ok(Transition {
            invoice_no: self.invoice_no.clone().unwrap_or_else(|| InvoiceNo::from("")),
            amount,
            from,
            to: self.status,
            paid_amount: self.paid_amount,
            balance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates an unpaid invoice.
    fn pending_invoice(no: &str, total: f64) -> Invoice {
        Invoice {
            invoice_no: Some(InvoiceNo::from(no)),
            client_name: "Acme Logistics".to_owned(),
            invoice_date: Some("2026-02-01".to_owned()),
            total_amount: total,
            balance: Some(total),
            ..Invoice::default()
        }
    }

    #[test]
    fn full_allocation_marks_paid() {
        let mut invoice = pending_invoice("CT0002", 89_625.0);
        let transition = invoice.allocate(89_625.0).unwrap();
        assert_eq!(transition.from, InvoiceStatus::Pending);
        assert_eq!(transition.to, InvoiceStatus::Paid);
        assert!((invoice.paid_amount - 89_625.0).abs() < f64::EPSILON);
        assert!(invoice.outstanding().abs() < f64::EPSILON);
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn partial_allocations_move_forward_only() {
        let mut invoice = pending_invoice("INV-7", 1_000.0);
        let mut last_paid = invoice.paid_amount;
        let mut last_status = invoice.status;
        for amount in [100.0, 250.0, 400.0, 250.0] {
            let transition = invoice.allocate(amount).unwrap();
            assert!(transition.paid_amount >= last_paid);
            assert!(transition.to >= last_status);
            last_paid = transition.paid_amount;
            last_status = transition.to;
        }
        assert_eq!(last_status, InvoiceStatus::Paid);
    }

    #[test]
    fn over_allocation_is_rejected_without_mutation() {
        let mut invoice = pending_invoice("INV-8", 500.0);
        let _first = invoice.allocate(200.0).unwrap();
        let before = invoice.clone();
        let err = invoice.allocate(300.01).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(invoice, before);
        assert_eq!(invoice.status, InvoiceStatus::Partial);
    }

    #[test]
    fn non_positive_allocation_is_rejected() {
        let mut invoice = pending_invoice("INV-9", 500.0);
        assert!(invoice.allocate(0.0).is_err());
        assert!(invoice.allocate(-5.0).is_err());
        assert!(invoice.allocate(f64::NAN).is_err());
        assert_eq!(invoice.status, InvoiceStatus::Pending);
    }

    #[test]
    fn outstanding_derived_when_balance_missing() {
        let invoice: Invoice = serde_json::from_str(
            r#"{"invoiceNo": "INV-1", "totalAmount": 1000, "paidAmount": 400}"#,
        )
        .unwrap();
        assert!((invoice.outstanding() - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stale_balance_cannot_admit_overpayment() {
        let mut invoice: Invoice = serde_json::from_str(
            r#"{"invoiceNo": "INV-2", "totalAmount": 1000, "paidAmount": 600, "balance": 1000, "status": "Partial"}"#,
        )
        .unwrap();
        assert!((invoice.outstanding() - 400.0).abs() < f64::EPSILON);

        let before = invoice.clone();
        assert!(invoice.allocate(1_000.0).unwrap_err().is_validation());
        assert_eq!(invoice, before);

        let transition = invoice.allocate(400.0).unwrap();
        assert_eq!(transition.to, InvoiceStatus::Paid);
        assert!(transition.balance.abs() < f64::EPSILON);
        assert!((invoice.paid_amount - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn normalize_rewrites_balance_and_status() {
        let mut stale: Invoice = serde_json::from_str(
            r#"{"invoiceNo": "INV-3", "totalAmount": 1000, "paidAmount": 600, "balance": 1000, "status": "Pending"}"#,
        )
        .unwrap();
        stale.normalize();
        assert!((stale.balance.unwrap() - 400.0).abs() < f64::EPSILON);
        assert_eq!(stale.status, InvoiceStatus::Partial);

        let mut unrecorded: Invoice = serde_json::from_str(
            r#"{"invoiceNo": "INV-4", "totalAmount": 1000, "balance": 250}"#,
        )
        .unwrap();
        unrecorded.normalize();
        assert!((unrecorded.paid_amount - 750.0).abs() < f64::EPSILON);
        assert!((unrecorded.balance.unwrap() - 250.0).abs() < f64::EPSILON);
        assert_eq!(unrecorded.status, InvoiceStatus::Partial);
    }

    #[test]
    fn unknown_status_label_reads_as_pending() {
        let invoice: Invoice = serde_json::from_str(
            r#"{"invoiceNo": "INV-5", "totalAmount": 100, "status": "Overdue", "items": null}"#,
        )
        .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert!(invoice.items.is_empty());
    }

    #[test]
    fn status_is_function_of_amounts() {
        assert_eq!(InvoiceStatus::for_amounts(0.0, 100.0), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::for_amounts(-1.0, 0.0), InvoiceStatus::Paid);
        assert_eq!(InvoiceStatus::for_amounts(50.0, 50.0), InvoiceStatus::Partial);
        assert_eq!(InvoiceStatus::for_amounts(100.0, 0.0), InvoiceStatus::Pending);
    }

    #[test]
    fn status_serializes_as_label() {
        let json = serde_json::to_string(&InvoiceStatus::Partial).unwrap();
        assert_eq!(json, r#""Partial""#);
    }
}
