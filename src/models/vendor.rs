//! Vendor (payables) models.

use serde::{Deserialize, Serialize};

use super::{InvoiceNo, InvoiceStatus, loose};

/// A bill received from a supplier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorInvoice {
    /// Storage identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Supplier's invoice number, the natural key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_no: Option<InvoiceNo>,
    /// Supplier name.
    #[serde(default)]
    pub vendor_name: String,
    /// Issue date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    /// Due date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Billing month label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    /// What was purchased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Amount owed.
    #[serde(default, deserialize_with = "loose::amount")]
    pub total_amount: f64,
    /// Amount settled so far.
    #[serde(default, deserialize_with = "loose::amount")]
    pub paid_amount: f64,
    /// Payment status.
    #[serde(default, deserialize_with = "loose::status")]
    pub status: InvoiceStatus,
}

/// A vendor payment line settling one vendor invoice.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPaymentLineItem {
    /// Vendor invoice being settled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_no: Option<InvoiceNo>,
    /// Supplier name copied from the invoice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    /// Allocated amount.
    #[serde(default, deserialize_with = "loose::amount")]
    pub allocated_amount: f64,
}

/// Money paid out to a supplier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorPayment {
    /// Storage identifier.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Payment reference, the preferred natural key.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Reference field used by older records.
    #[serde(default, deserialize_with = "loose::opt_string", skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    /// Supplier name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    /// Gross amount before withholding.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    /// Gross amount as stored by older records.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Amount actually paid after withholding.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<f64>,
    /// Withholding tax rate in percent.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    /// Withheld tax amount.
    #[serde(default, deserialize_with = "loose::opt_amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    /// Payment method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Date the money left the bank (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    /// Settled vendor invoices.
    #[serde(default, deserialize_with = "loose::list")]
    pub line_items: Vec<VendorPaymentLineItem>,
}

impl VendorPayment {
    /// Returns the supplier name, falling back to the first line item.
    #[inline]
    #[must_use]
    pub fn resolved_vendor_name(&self) -> Option<&str> {
        self.vendor_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                self.line_items
                    .first()
                    .and_then(|item| item.vendor_name.as_deref())
            })
    }

    /// Returns the most specific reference available.
    #[inline]
    #[must_use]
    pub fn reference_label(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.payment_reference.as_deref())
            .or(self.id.as_deref())
    }
}
