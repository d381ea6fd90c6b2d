//! JSON-file-based storage backend.
//!
//! Stores each collection in a separate JSON file under a configurable
//! directory (default: `$XDG_DATA_HOME/fleetledger/`).

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use super::{Storage, StorageKey};
use crate::error::{LedgerError, Result};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "fleetledger";

/// File-backed storage that persists each collection as `<key>.json`.
///
/// # Concurrency
///
/// In-process access is serialized by a [`Mutex`]. Writes go to a
/// temporary file that is then renamed over the target, so a crash or a
/// failed write never leaves a half-written collection behind.
///
/// # File layout
///
/// ```text
/// <dir>/
///   clients.json
///   vehicles.json
///   invoices.json
///   vendor_invoices.json
///   payments.json
///   vendor_payments.json
///   salary_expenses.json
///   daily_expenses.json
///   archived_vehicles.json
///   audit_log.json
///   users.json
///   schema_version.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory containing all JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/fleetledger/` (typically
    /// `~/.local/share/fleetledger/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                LedgerError::Storage("could not determine platform data directory".into())
            })
    }

    /// Returns the root directory.
    #[inline]
    #[must_use]
    pub const fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Returns the full path of the file backing `key`.
    fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.name()))
    }

    /// Acquires the in-process guard.
    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|err| lock_poison_error(&err))
    }
}

impl Storage for FileStorage {
    #[inline]
    fn read(&self, key: StorageKey) -> Result<Option<String>> {
        let _guard = self.guard()?;
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    #[inline]
    fn write(&self, key: StorageKey, contents: &str) -> Result<()> {
        let _guard = self.guard()?;
        let path = self.path(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key.name()));
        fs::write(&tmp_path, contents).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
        Ok(())
    }

    #[inline]
    fn remove(&self, key: StorageKey) -> Result<()> {
        let _guard = self.guard()?;
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_io_error(err)),
        }
    }
}

/// Wraps an I/O error into a [`LedgerError::Storage`].
fn storage_io_error(err: io::Error) -> LedgerError {
    LedgerError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`LedgerError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}
