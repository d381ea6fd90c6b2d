//! Client payment model.

use serde::{Deserialize, Serialize};

use super::{InvoiceNo, loose};

/// Part of a payment allocated to one invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLineItem {
    /// Invoice receiving the allocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_no: Option<InvoiceNo>,
    /// Client name copied from the invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Invoice balance at the time the payment was captured.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub invoice_balance: Option<f64>,
    /// Amount allocated to the invoice (pre-tax).
    #[serde(default, deserialize_with = "loose::amount")]
    pub allocated_amount: f64,
}

/// Money received from a client, possibly spread over several invoices.
///
/// The amount fields are inconsistent across record generations; use
/// [`crate::tax::resolve`] to obtain the credited amount.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Storage identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Payment reference, the preferred natural key.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Reference field used by older records.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    /// Paying client's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Gross amount before withholding.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    /// Gross amount as stored by older records.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Amount actually received after withholding.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<f64>,
    /// Withholding tax rate in percent.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    /// Withheld tax amount.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    /// Payment method (bank transfer, cheque, mobile money, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Date the money was received (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    /// Allocations against invoices.
    #[serde(default, deserialize_with = "loose::list")]
    pub line_items: Vec<PaymentLineItem>,
}

impl Payment {
    /// Returns the paying client's name, falling back to the first line
    /// item's client name.
    #[inline]
    #[must_use]
    pub fn resolved_client_name(&self) -> Option<&str> {
        self.client_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                self.line_items
                    .first()
                    .and_then(|item| item.client_name.as_deref())
            })
    }

    /// Returns the most specific reference available (`reference`, then
    /// `paymentReference`, then `id`).
    #[inline]
    #[must_use]
    pub fn reference_label(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.payment_reference.as_deref())
            .or(self.id.as_deref())
    }

    /// Sum of all line item allocations.
    #[inline]
    #[must_use]
    pub fn allocated_total(&self) -> f64 {
        self.line_items
            .iter()
            .map(|item| item.allocated_amount)
            .sum()
    }
}
