//! Payment allocation against stored invoices.
//!
//! Invoices are only ever mutated here. Every request is validated in
//! full before anything changes, so a rejected payment leaves invoices,
//! payments and the audit log exactly as they were.

use std::collections::HashMap;

use crate::audit::AuditTrail;
use crate::error::{LedgerError, Result};
use crate::models::{
    AMOUNT_TOLERANCE, AuditAction, AuditEntry, Invoice, InvoiceNo, Payment, Transition,
};
use crate::reconcile::NaturalKey as _;
use crate::storage::{RecordStore, Storage};
use crate::tax::{self, ResolvedAmount};

/// Who is performing a change, for the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    /// Username.
    pub username: String,
    /// Role, if known.
    pub role: Option<String>,
}

impl Operator {
    /// Creates an operator without a role.
    #[inline]
    #[must_use]
    pub fn new<T: Into<String>>(username: T) -> Self {
        Self {
            username: username.into(),
            role: None,
        }
    }

    /// Sets the operator's role.
    #[inline]
    #[must_use]
    pub fn role<T: Into<String>>(mut self, role: T) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// Outcome of a recorded payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    /// Payment reference.
    pub reference: String,
    /// Resolved amounts of the payment.
    pub amounts: ResolvedAmount,
    /// Invoice transitions, in line item order.
    pub transitions: Vec<Transition>,
}

/// Invoice collection loaded from a record store.
///
/// Each successful allocation is saved immediately.
#[derive(Debug)]
pub struct InvoiceBook<'store, S: Storage> {
    /// Backing record store.
    store: &'store RecordStore<S>,
    /// Loaded invoices.
    invoices: Vec<Invoice>,
}

impl<'store, S: Storage> InvoiceBook<'store, S> {
    /// Loads the invoices stored in `store`, with balances and statuses
    /// re-derived from the amounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored invoices cannot be read in full.
    #[inline]
    pub fn load(store: &'store RecordStore<S>) -> Result<Self> {
        Ok(Self {
            store,
            invoices: load_invoices(store)?,
        })
    }

    /// Returns the loaded invoices.
    #[inline]
    #[must_use]
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// Looks up an invoice by number.
    #[inline]
    #[must_use]
    pub fn find(&self, invoice_no: &str) -> Option<&Invoice> {
        self.invoices
            .iter()
            .find(|invoice| invoice.number() == invoice_no)
    }

    /// Allocates `amount` to one invoice and saves the collection.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown invoice,
    /// [`LedgerError::Validation`] for a non-positive or excessive amount,
    /// and a storage error if saving fails (the allocation is then undone).
    #[inline]
    #[tracing::instrument(skip(self))]
    pub fn allocate(&mut self, invoice_no: &str, amount: f64) -> Result<Transition> {
        let index = self.position(invoice_no)?;
        let slot = self
            .invoices
            .get_mut(index)
            .ok_or_else(|| not_found(invoice_no))?;
        let before = slot.clone();
        let transition = slot.allocate(amount)?;
        if let Err(err) = self.store.save_invoices(&self.invoices) {
            if let Some(restore) = self.invoices.get_mut(index) {
                *restore = before;
            }
            return Err(err);
        }
        Ok(transition)
    }

    /// Index of the invoice numbered `invoice_no`.
    fn position(&self, invoice_no: &str) -> Result<usize> {
        self.invoices
            .iter()
            .position(|invoice| invoice.number() == invoice_no)
            .ok_or_else(|| not_found(invoice_no))
    }
}

/// Loads every stored invoice for modification and normalizes each one.
fn load_invoices<S: Storage>(store: &RecordStore<S>) -> Result<Vec<Invoice>> {
    let mut invoices = store.try_invoices()?;
    invoices.iter_mut().for_each(Invoice::normalize);
    Ok(invoices)
}

/// Builds the error for an unknown invoice number.
fn not_found(invoice_no: &str) -> LedgerError {
    LedgerError::NotFound {
        kind: "invoice",
        key: invoice_no.to_owned(),
    }
}

/// Checks the fields of a payment that do not depend on stored invoices.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] describing the first problem found.
#[inline]
pub fn validate_payment(payment: &Payment) -> Result<()> {
    if payment.natural_key().is_none() {
        return Err(LedgerError::Validation(
            "payment reference is required".to_owned(),
        ));
    }
    if payment.line_items.is_empty() {
        return Err(LedgerError::Validation(
            "payment must allocate to at least one invoice".to_owned(),
        ));
    }
    for item in &payment.line_items {
        let number = item.invoice_no.as_ref().filter(|no| !no.is_blank());
        let Some(invoice_no) = number else {
            return Err(LedgerError::Validation(
                "every line item needs an invoice number".to_owned(),
            ));
        };
        if !item.allocated_amount.is_finite() || item.allocated_amount <= 0.0_f64 {
            return Err(LedgerError::Validation(format!(
                "allocation to invoice {invoice_no} must be a positive amount"
            )));
        }
    }
    if let Some(total) = payment.total_amount {
        let allocated = payment.allocated_total();
        if (allocated - total).abs() > AMOUNT_TOLERANCE {
            return Err(LedgerError::Validation(format!(
                "allocations sum to {allocated:.2} but the payment total is {total:.2}"
            )));
        }
    }
    Ok(())
}

/// Records a client payment: validates it, allocates every line item to
/// its invoice, appends the payment and writes an audit entry.
///
/// Line items without a client name or invoice balance are filled in from
/// the invoice as it was before the payment.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] for a malformed, duplicate or
/// over-allocating payment, [`LedgerError::NotFound`] for an unknown
/// invoice, [`LedgerError::Serialization`] if the stored invoices or
/// payments cannot be read in full, and a storage error if persisting
/// fails. Nothing is changed on error.
#[inline]
#[tracing::instrument(skip_all)]
pub fn record_payment<S: Storage>(
    store: &RecordStore<S>,
    mut payment: Payment,
    operator: &Operator,
) -> Result<PaymentReceipt> {
    validate_payment(&payment)?;
    let reference = payment.natural_key().unwrap_or_default().to_owned();

    let mut payments = store.try_payments()?;
    if payments
        .iter()
        .any(|existing| existing.natural_key() == Some(reference.as_str()))
    {
        return Err(LedgerError::Validation(format!(
            "payment {reference} is already recorded"
        )));
    }

    let original = load_invoices(store)?;
    let plan = plan_allocations(&original, &payment)?;

    let mut invoices = original.clone();
    let mut transitions = Vec::with_capacity(plan.len());
    for (item, &(index, amount)) in payment.line_items.iter_mut().zip(&plan) {
        let invoice = invoices.get_mut(index).ok_or_else(|| {
            not_found(item.invoice_no.as_ref().map_or("", InvoiceNo::as_inner))
        })?;
        if item.client_name.is_none() {
            item.client_name = Some(invoice.client_name.clone());
        }
        if item.invoice_balance.is_none() {
            item.invoice_balance = Some(invoice.outstanding());
        }
        transitions.push(invoice.allocate(amount)?);
    }
    if payment.client_name.is_none() {
        payment.client_name = payment
            .line_items
            .first()
            .and_then(|item| item.client_name.clone());
    }

    let amounts = tax::resolve(&payment);
    store.save_invoices(&invoices)?;
    payments.push(payment);
    if let Err(err) = store.save_payments(&payments) {
        if let Err(restore_err) = store.save_invoices(&original) {
            tracing::error!(error = %restore_err, "failed to restore invoices after payment save failure");
        }
        return Err(err);
    }

    let invoice_list: Vec<&str> = transitions
        .iter()
        .map(|transition| transition.invoice_no.as_inner())
        .collect();
    let mut entry = AuditEntry::new(AuditAction::Create, "payment", operator.username.as_str())
        .details(format!(
            "payment {reference} of {:.2} allocated to {}",
            amounts.raw_amount,
            invoice_list.join(", ")
        ));
    if let Some(role) = operator.role.as_deref() {
        entry = entry.role(role);
    }
    if let Err(err) = AuditTrail::new(store).append(entry) {
        tracing::error!(error = %err, "payment recorded but audit entry could not be saved");
    }

    tracing::info!(transitions = transitions.len(), "payment recorded");
    Ok(PaymentReceipt {
        reference,
        amounts,
        transitions,
    })
}

/// Resolves each line item to an invoice index and checks the cumulative
/// allocation per invoice against its outstanding balance.
fn plan_allocations(invoices: &[Invoice], payment: &Payment) -> Result<Vec<(usize, f64)>> {
    let mut cumulative: HashMap<usize, f64> = HashMap::new();
    let mut plan = Vec::with_capacity(payment.line_items.len());
    for item in &payment.line_items {
        let invoice_no = item.invoice_no.as_ref().map_or("", InvoiceNo::as_inner);
        let index = invoices
            .iter()
            .position(|invoice| invoice.number() == invoice_no)
            .ok_or_else(|| not_found(invoice_no))?;
        let total = cumulative.entry(index).or_insert(0.0_f64);
        *total += item.allocated_amount;
        if let Some(invoice) = invoices.get(index) {
            invoice.check_allocation(*total)?;
        }
        plan.push((index, item.allocated_amount));
    }
    Ok(plan)
}
