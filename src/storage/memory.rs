//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! [`Storage`]. Ideal for unit tests and offline demos where file I/O is
//! undesirable.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Storage, StorageKey};
use crate::error::{LedgerError, Result};

/// Thread-safe in-memory storage.
///
/// # Example
///
/// ```rust
/// use fleetledger::storage::{InMemoryStorage, RecordStore};
///
/// let store = RecordStore::new(InMemoryStorage::new());
/// assert!(store.invoices().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Stored blobs behind a single mutex.
    inner: Mutex<HashMap<StorageKey, String>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R, F>(&self, apply: F) -> Result<R>
    where
        F: FnOnce(&mut HashMap<StorageKey, String>) -> R,
    {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(apply(&mut inner))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}

impl Storage for InMemoryStorage {
    #[inline]
    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        self.with_lock(|inner| inner.get(&key).cloned())
    }

    #[inline]
    fn write(&self, key: StorageKey, contents: &str) -> Result<()> {
        self.with_lock(|inner| {
            let _previous = inner.insert(key, contents.to_owned());
        })
    }

    #[inline]
    fn remove(&self, key: StorageKey) -> Result<()> {
        self.with_lock(|inner| {
            let _previous = inner.remove(&key);
        })
    }
}
