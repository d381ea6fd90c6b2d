//! Data models for ERP records.
//!
//! Records mirror the JSON documents produced by the dashboard front-end
//! and the remote API (camelCase fields, loosely typed identifiers and
//! amounts). Newtype IDs guard the natural keys that matter for
//! reconciliation.

mod audit;
mod client;
mod expense;
mod ids;
mod invoice;
mod loose;
mod payment;
mod period;
mod user;
mod vehicle;
mod vendor;

pub use audit::{AuditAction, AuditEntry};
pub use chrono::NaiveDate;
pub use client::{Client, ClientStatus};
pub use expense::{DailyExpense, SalaryExpense};
pub use ids::{InvoiceNo, RegistrationNo};
pub(crate) use invoice::AMOUNT_TOLERANCE;
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, Transition};
pub use payment::{Payment, PaymentLineItem};
pub use period::{YearMonth, epoch_date, parse_record_date};
pub use user::UserAccount;
pub use vehicle::Vehicle;
pub use vendor::{VendorInvoice, VendorPayment, VendorPaymentLineItem};
