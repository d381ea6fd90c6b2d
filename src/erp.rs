//! High-level ERP facade with integrated storage.
//!
//! Combines a [`RemoteSource`] with a [`Storage`] backend: reconciled
//! snapshots, cache refresh, ledgers, payment recording, the audit log and
//! the schema guard behind one value.

use core::time::Duration;

use crate::allocation::{self, Operator, PaymentReceipt};
use crate::audit::AuditTrail;
use crate::client::{Offline, RemoteSource};
use crate::error::{LedgerError, Result};
use crate::ledger::{self, ClientBalance, LedgerFilter, LedgerKind, LedgerReport};
use crate::models::{AuditEntry, Payment};
use crate::reconcile::{self, Deadline, LedgerSnapshot};
use crate::storage::schema::{self, ResetConfirmation, ResetReport, SchemaStatus};
use crate::storage::{RecordStore, Storage};

/// Builder for constructing an [`Erp`].
#[derive(Debug)]
pub struct ErpBuilder<S: Storage, R: RemoteSource> {
    /// Storage backend.
    storage: Option<S>,
    /// Remote record source.
    remote: R,
    /// Budget for remote fetches.
    timeout: Duration,
}

impl<S: Storage, R: RemoteSource> ErpBuilder<S, R> {
    /// Sets the storage backend.
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the remote record source (offline by default).
    #[inline]
    #[must_use]
    pub fn remote<T: RemoteSource>(self, remote: T) -> ErpBuilder<S, T> {
        ErpBuilder {
            storage: self.storage,
            remote,
            timeout: self.timeout,
        }
    }

    /// Sets the budget for remote fetches (default 2.5 s).
    #[inline]
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the facade.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if no storage was provided.
    #[inline]
    pub fn build(self) -> Result<Erp<S, R>> {
        let storage = self
            .storage
            .ok_or_else(|| LedgerError::Storage("storage backend is required".into()))?;
        Ok(Erp {
            store: RecordStore::new(storage),
            remote: self.remote,
            timeout: self.timeout,
        })
    }
}

/// ERP ledger engine over a remote source and a local record store.
///
/// Use [`Erp::builder()`] to construct an instance.
///
/// # Example
///
/// ```rust
/// use fleetledger::erp::Erp;
/// use fleetledger::storage::InMemoryStorage;
///
/// let erp = Erp::builder().storage(InMemoryStorage::new()).build().unwrap();
/// assert!(erp.local_snapshot().invoices.is_empty());
/// ```
#[derive(Debug)]
pub struct Erp<S: Storage, R: RemoteSource = Offline> {
    /// Local record store.
    store: RecordStore<S>,
    /// Remote record source.
    remote: R,
    /// Budget for remote fetches.
    timeout: Duration,
}

impl<S: Storage> Erp<S, Offline> {
    /// Creates a new builder for configuring the facade.
    #[inline]
    #[must_use]
    pub const fn builder() -> ErpBuilder<S, Offline> {
        ErpBuilder {
            storage: None,
            remote: Offline,
            timeout: Deadline::DEFAULT_BUDGET,
        }
    }
}

impl<S: Storage, R: RemoteSource> Erp<S, R> {
    /// Returns the local record store.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// Returns the remote source.
    #[inline]
    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Deadline for a fetch starting now.
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.timeout)
    }

    /// Snapshot of the local cache only.
    #[inline]
    #[must_use]
    pub fn local_snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::from_store(&self.store)
    }

    /// Fetches every remote collection and reconciles it with the cache.
    #[inline]
    pub async fn snapshot(&self) -> LedgerSnapshot {
        reconcile::fetch_snapshot(&self.remote, &self.store, self.deadline()).await
    }

    /// Reconciles remote and cached records and writes the result back to
    /// the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be saved.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub async fn sync(&self) -> Result<LedgerSnapshot> {
        let snapshot = self.snapshot().await;
        snapshot.persist_remote_collections(&self.store)?;
        tracing::info!(
            clients = snapshot.clients.len(),
            vehicles = snapshot.vehicles.len(),
            invoices = snapshot.invoices.len(),
            payments = snapshot.payments.len(),
            "local cache refreshed"
        );
        Ok(snapshot)
    }

    /// Builds one ledger from a fresh snapshot.
    #[inline]
    pub async fn ledger(&self, kind: LedgerKind, filter: &LedgerFilter) -> LedgerReport {
        let snapshot = self.snapshot().await;
        match kind {
            LedgerKind::Client => ledger::client_ledger(&snapshot, filter),
            LedgerKind::Vendor => ledger::vendor_ledger(&snapshot, filter),
            LedgerKind::Bank => ledger::bank_ledger(&snapshot, filter),
        }
    }

    /// Derived balance of every client, from a fresh snapshot.
    #[inline]
    pub async fn client_balances(&self) -> Vec<ClientBalance> {
        ledger::client_balances(&self.snapshot().await)
    }

    /// Records a client payment against the cached invoices.
    ///
    /// # Errors
    ///
    /// See [`allocation::record_payment`].
    #[inline]
    pub fn record_payment(&self, payment: Payment, operator: &Operator) -> Result<PaymentReceipt> {
        allocation::record_payment(&self.store, payment, operator)
    }

    /// Up to `limit` audit entries, newest first.
    #[inline]
    #[must_use]
    pub fn audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        AuditTrail::new(&self.store).recent(limit)
    }

    /// Compares the stored schema marker with the current version.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be read.
    #[inline]
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        schema::check(&self.store)
    }

    /// Marks the store as current without touching data.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be written.
    #[inline]
    pub fn adopt_schema(&self) -> Result<()> {
        schema::stamp(&self.store)
    }

    /// Wipes business data and writes the current schema marker.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be removed or the marker written.
    #[inline]
    pub fn reset_schema(&self, confirmation: ResetConfirmation) -> Result<ResetReport> {
        schema::reset(&self.store, confirmation)
    }
}
