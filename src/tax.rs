//! Tax & amount resolution for payment-like records.
//!
//! Payments have been stored with different combinations of `totalAmount`,
//! `amount`, `netAmount`, `taxRate` and `taxAmount`. Every place that needs
//! the credited amount of a payment goes through [`resolve`], so ledger
//! rows, allocation checks and summaries agree.

use crate::models::{Payment, VendorPayment};

/// Read access to the amount fields of a payment-like record.
pub trait PaymentAmounts {
    /// Gross amount (`totalAmount`).
    fn total_amount(&self) -> Option<f64>;
    /// Gross amount from older records (`amount`).
    fn amount(&self) -> Option<f64>;
    /// Received amount after withholding (`netAmount`).
    fn net_amount(&self) -> Option<f64>;
    /// Withholding rate in percent (`taxRate`).
    fn tax_rate(&self) -> Option<f64>;
    /// Withheld amount (`taxAmount`).
    fn tax_amount(&self) -> Option<f64>;
}

/// The amounts a payment contributes to a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResolvedAmount {
    /// Amount credited (never negative).
    pub net_credit: f64,
    /// Amount withheld as tax.
    pub tax_deduction: f64,
    /// Gross amount the resolution started from.
    pub raw_amount: f64,
}

/// Resolves the gross amount, tax deduction and net credit of a payment.
///
/// Precedence:
/// 1. `raw = totalAmount ?? amount ?? netAmount ?? 0`
/// 2. `tax = taxAmount ?? raw * (taxRate ?? 0) / 100`
/// 3. `net = netAmount ?? max(raw - tax, 0)`
///
/// A field counts as present when it holds a finite number or a numeric
/// string (`"1500"`), so a `taxAmount` written as text still overrides the
/// rate. Blank, null and non-numeric values count as absent.
#[inline]
#[must_use]
pub fn resolve<P: PaymentAmounts + ?Sized>(record: &P) -> ResolvedAmount {
    let raw_amount = finite(record.total_amount())
        .or_else(|| finite(record.amount()))
        .or_else(|| finite(record.net_amount()))
        .unwrap_or(0.0_f64);
    let tax_deduction = finite(record.tax_amount()).unwrap_or_else(|| {
        let rate = finite(record.tax_rate()).unwrap_or(0.0_f64);
        raw_amount * rate / 100.0_f64
    });
    let net_credit = finite(record.net_amount())
        .unwrap_or(raw_amount - tax_deduction)
        .max(0.0_f64);
    ResolvedAmount {
        net_credit,
        tax_deduction,
        raw_amount,
    }
}

/// Treats non-finite numbers as absent.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|amount| amount.is_finite())
}

/// Implements [`PaymentAmounts`] for records exposing the standard fields.
macro_rules! impl_payment_amounts {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl PaymentAmounts for $ty {
                #[inline]
                fn total_amount(&self) -> Option<f64> {
                    self.total_amount
                }

                #[inline]
                fn amount(&self) -> Option<f64> {
                    self.amount
                }

                #[inline]
                fn net_amount(&self) -> Option<f64> {
                    self.net_amount
                }

                #[inline]
                fn tax_rate(&self) -> Option<f64> {
                    self.tax_rate
                }

                #[inline]
                fn tax_amount(&self) -> Option<f64> {
                    self.tax_amount
                }
            }
        )+
    };
}

impl_payment_amounts!(Payment, VendorPayment);
