//! Append-only audit trail persisted next to the business data.

use crate::error::Result;
use crate::models::AuditEntry;
use crate::storage::{RecordStore, Storage};

/// Maximum number of entries kept; older ones are evicted first.
pub const AUDIT_CAPACITY: usize = 100;

/// Audit log view over a [`RecordStore`].
///
/// Entries are stored oldest first.
#[derive(Debug)]
pub struct AuditTrail<'store, S: Storage> {
    /// Backing record store.
    store: &'store RecordStore<S>,
}

impl<'store, S: Storage> AuditTrail<'store, S> {
    /// Wraps a record store.
    #[inline]
    #[must_use]
    pub const fn new(store: &'store RecordStore<S>) -> Self {
        Self { store }
    }

    /// Appends an entry, evicting the oldest ones beyond [`AUDIT_CAPACITY`].
    ///
    /// # Errors
    ///
    /// Returns an error if the stored log cannot be read in full (it is
    /// then left untouched) or cannot be saved.
    #[inline]
    pub fn append(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = self.store.try_audit_entries()?;
        entries.push(entry);
        let excess = entries.len().saturating_sub(AUDIT_CAPACITY);
        if excess > 0 {
            tracing::debug!(evicted = excess, "audit log at capacity");
            drop(entries.drain(..excess));
        }
        self.store.save_audit_entries(&entries)
    }

    /// Returns up to `limit` entries, newest first.
    #[inline]
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let mut entries = self.store.audit_entries();
        entries.reverse();
        entries.truncate(limit);
        entries
    }
}
