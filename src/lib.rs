//! Ledger reconciliation and invoice/payment lifecycle engine for a
//! vehicle-tracking ERP.
//!
//! Records come from two places: a remote ERP API and a local record
//! cache. This crate merges them into one view, derives client, vendor and
//! bank ledgers with running balances, and allocates client payments to
//! invoices with status transitions and an audit trail.
//!
//! # Example
//!
//! ```rust
//! use fleetledger::ledger::{LedgerFilter, client_ledger};
//! use fleetledger::reconcile::LedgerSnapshot;
//! use fleetledger::storage::{InMemoryStorage, RecordStore};
//!
//! let store = RecordStore::new(InMemoryStorage::new());
//! let snapshot = LedgerSnapshot::from_store(&store);
//! let report = client_ledger(&snapshot, &LedgerFilter::new());
//! assert!(report.rows.is_empty());
//! ```

pub mod allocation;
pub mod audit;
#[cfg(feature = "remote")]
pub mod client;
#[cfg(feature = "remote")]
pub mod erp;
pub mod error;
pub mod ledger;
pub mod models;
pub mod reconcile;
pub mod storage;
pub mod tax;

#[cfg(feature = "remote")]
pub use erp::{Erp, ErpBuilder};
pub use error::{LedgerError, Result};
