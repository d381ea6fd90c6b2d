//! Schema version marker and the destructive business-data reset.
//!
//! Older dashboards wiped every business collection whenever the stored
//! marker differed from the version they shipped with. Here a mismatch is
//! only *reported*; wiping requires an explicit [`ResetConfirmation`] and
//! is logged.

use super::{RecordStore, Storage, StorageKey};
use crate::error::Result;

/// Schema version written by this release.
pub const SCHEMA_VERSION: &str = "3";

/// Outcome of comparing the stored marker with [`SCHEMA_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The stored marker matches.
    Current,
    /// The marker is absent or differs.
    Mismatch {
        /// Marker found in storage, if any.
        stored: Option<String>,
        /// Marker this release expects.
        target: &'static str,
    },
}

/// Proof that the caller accepted losing all business data.
///
/// Only obtainable through [`ResetConfirmation::acknowledge_data_loss`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetConfirmation {
    /// Prevents construction outside this module.
    _private: (),
}

impl ResetConfirmation {
    /// Acknowledges that a reset permanently deletes clients, vehicles,
    /// invoices, payments, vendor records and expenses.
    #[inline]
    #[must_use]
    pub const fn acknowledge_data_loss() -> Self {
        Self { _private: () }
    }
}

/// Summary of a completed reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetReport {
    /// Marker that was replaced.
    pub previous: Option<String>,
    /// Keys that were wiped.
    pub wiped: Vec<StorageKey>,
}

/// Reads the stored marker. A corrupt marker reads as absent.
///
/// # Errors
///
/// Returns an error if the backend fails to read.
#[inline]
pub fn stored_version<S: Storage>(store: &RecordStore<S>) -> Result<Option<String>> {
    let raw = store.backend().read(StorageKey::SchemaVersion)?;
    Ok(raw.and_then(|contents| {
        serde_json::from_str::<String>(&contents)
            .map_err(|err| {
                tracing::warn!(error = %err, "corrupt schema marker");
            })
            .ok()
    }))
}

/// Compares the stored marker with [`SCHEMA_VERSION`].
///
/// # Errors
///
/// Returns an error if the backend fails to read.
#[inline]
pub fn check<S: Storage>(store: &RecordStore<S>) -> Result<SchemaStatus> {
    let stored = stored_version(store)?;
    if stored.as_deref() == Some(SCHEMA_VERSION) {
        return Ok(SchemaStatus::Current);
    }
    tracing::warn!(
        stored = stored.as_deref().unwrap_or("<none>"),
        target = SCHEMA_VERSION,
        "schema version mismatch"
    );
    Ok(SchemaStatus::Mismatch {
        stored,
        target: SCHEMA_VERSION,
    })
}

/// Writes the current marker without touching any data (used to adopt an
/// existing store).
///
/// # Errors
///
/// Returns an error if the marker cannot be serialized or written.
#[inline]
pub fn stamp<S: Storage>(store: &RecordStore<S>) -> Result<()> {
    let json = serde_json::to_string(SCHEMA_VERSION)?;
    store.backend().write(StorageKey::SchemaVersion, &json)
}

/// Wipes every business-data collection and writes the current marker.
///
/// The audit log and user accounts are preserved. This is destructive and
/// irreversible.
///
/// # Errors
///
/// Returns an error if any removal or the marker write fails; keys removed
/// before the failure stay removed.
#[inline]
#[tracing::instrument(skip_all)]
pub fn reset<S: Storage>(
    store: &RecordStore<S>,
    _confirmation: ResetConfirmation,
) -> Result<ResetReport> {
    let previous = stored_version(store)?;
    tracing::warn!(
        previous = previous.as_deref().unwrap_or("<none>"),
        target = SCHEMA_VERSION,
        "wiping all business data for schema reset"
    );
    let mut wiped = Vec::with_capacity(StorageKey::BUSINESS_DATA.len());
    for key in StorageKey::BUSINESS_DATA {
        store.backend().remove(key)?;
        wiped.push(key);
    }
    stamp(store)?;
    Ok(ResetReport { previous, wiped })
}
