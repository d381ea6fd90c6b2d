//! Record store: pluggable persistence for ERP collections.
//!
//! Every collection is persisted as one whole JSON array under a fixed
//! [`StorageKey`]. Backends implement the raw [`Storage`] trait;
//! [`RecordStore`] adds typed loading on top in two flavours: tolerant
//! loads for reading (malformed records are skipped) and strict loads for
//! load-modify-save paths, which must never write back a collection they
//! could not read in full.

#[cfg(feature = "storage-file")]
mod file;
mod memory;
pub mod schema;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LedgerError, Result};
use crate::models::{
    AuditEntry, Client, DailyExpense, Invoice, Payment, SalaryExpense, UserAccount, Vehicle,
    VendorInvoice, VendorPayment,
};
use crate::reconcile::decode_records;

/// Fixed key namespace of persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// Clients.
    Clients,
    /// Active vehicles.
    Vehicles,
    /// Client invoices.
    Invoices,
    /// Vendor invoices.
    VendorInvoices,
    /// Client payments.
    Payments,
    /// Vendor payments.
    VendorPayments,
    /// Salary disbursements.
    SalaryExpenses,
    /// Daily expenses.
    DailyExpenses,
    /// Vehicles removed from service.
    ArchivedVehicles,
    /// Append-only audit trail.
    AuditLog,
    /// Operator accounts.
    Users,
    /// Schema version marker.
    SchemaVersion,
}

impl StorageKey {
    /// Every key, in a stable order.
    pub const ALL: [Self; 12] = [
        Self::Clients,
        Self::Vehicles,
        Self::Invoices,
        Self::VendorInvoices,
        Self::Payments,
        Self::VendorPayments,
        Self::SalaryExpenses,
        Self::DailyExpenses,
        Self::ArchivedVehicles,
        Self::AuditLog,
        Self::Users,
        Self::SchemaVersion,
    ];

    /// Keys holding business data (wiped by a schema reset). The audit
    /// trail, user accounts and the marker itself are not included.
    pub const BUSINESS_DATA: [Self; 9] = [
        Self::Clients,
        Self::Vehicles,
        Self::Invoices,
        Self::VendorInvoices,
        Self::Payments,
        Self::VendorPayments,
        Self::SalaryExpenses,
        Self::DailyExpenses,
        Self::ArchivedVehicles,
    ];

    /// Stable storage name of the key.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Vehicles => "vehicles",
            Self::Invoices => "invoices",
            Self::VendorInvoices => "vendor_invoices",
            Self::Payments => "payments",
            Self::VendorPayments => "vendor_payments",
            Self::SalaryExpenses => "salary_expenses",
            Self::DailyExpenses => "daily_expenses",
            Self::ArchivedVehicles => "archived_vehicles",
            Self::AuditLog => "audit_log",
            Self::Users => "users",
            Self::SchemaVersion => "schema_version",
        }
    }
}

impl core::fmt::Display for StorageKey {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw persistence backend: whole-blob reads and writes per key.
///
/// All methods take `&self`; implementations use interior mutability
/// (e.g. `Mutex`). A `write` must be atomic: readers observe either the
/// previous or the new contents, never a partial write.
pub trait Storage: core::fmt::Debug + Send + Sync {
    /// Returns the stored contents of `key`, or `Ok(None)` if nothing has
    /// been stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to read.
    fn read(&self, key: StorageKey) -> Result<Option<String>>;

    /// Replaces the contents of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to write.
    fn write(&self, key: StorageKey, contents: &str) -> Result<()>;

    /// Deletes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to delete.
    fn remove(&self, key: StorageKey) -> Result<()>;
}

/// Typed, corruption-tolerant access to persisted collections.
#[derive(Debug)]
pub struct RecordStore<S: Storage> {
    /// Raw backend.
    backend: S,
}

/// Generates typed `load`/`try_load`/`save` accessors per collection.
macro_rules! define_collections {
    ($($load:ident, $try_load:ident, $save:ident, $ty:ty, $key:ident, $label:literal;)+) => {
        $(
            #[doc = concat!("Loads all readable stored ", $label, " (malformed records are skipped).")]
            #[inline]
            #[must_use]
            pub fn $load(&self) -> Vec<$ty> {
                self.load(StorageKey::$key)
            }

            #[doc = concat!("Loads all stored ", $label, " for a load-modify-save.\n\n# Errors\n\nReturns an error if the stored collection or any record in it cannot be read.")]
            #[inline]
            pub fn $try_load(&self) -> Result<Vec<$ty>> {
                self.try_load(StorageKey::$key)
            }

            #[doc = concat!("Persists the full collection of ", $label, ".\n\n# Errors\n\nReturns an error if serialization or the backend write fails; the previous contents stay in place.")]
            #[inline]
            pub fn $save(&self, items: &[$ty]) -> Result<()> {
                self.save(StorageKey::$key, items)
            }
        )+
    };
}

impl<S: Storage> RecordStore<S> {
    /// Wraps a storage backend.
    #[inline]
    #[must_use]
    pub const fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Returns the raw backend.
    #[inline]
    #[must_use]
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Loads and deserializes the collection stored under `key`.
    ///
    /// Never fails. Records are decoded one by one and malformed ones are
    /// skipped with a warning, so one bad record never hides the rest. A
    /// missing key, a backend read error, or contents that are not a JSON
    /// array yield an empty collection (the latter two are logged).
    ///
    /// Use [`RecordStore::try_load`] when the result will be saved back.
    #[inline]
    #[must_use]
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Vec<T> {
        let contents = match self.backend.read(key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "failed to read collection, using empty");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Value>>(&contents) {
            Ok(raw) => decode_records(key.name(), raw),
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "corrupt collection, using empty");
                Vec::new()
            }
        }
    }

    /// Loads the collection stored under `key`, failing unless every
    /// record decodes.
    ///
    /// A missing key is an empty collection. Load-modify-save paths use
    /// this so that a collection which could not be read in full is never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend read fails, and
    /// [`LedgerError::Serialization`] if the contents are not a JSON array
    /// or any record in it is malformed.
    #[inline]
    pub fn try_load<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Vec<T>> {
        let Some(contents) = self.backend.read(key)? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&contents).map_err(|err| {
            tracing::error!(key = %key, error = %err, "stored collection is unreadable, refusing to modify it");
            LedgerError::from(err)
        })
    }

    /// Serializes and persists `items` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails. The
    /// failure is logged and the previously stored contents stay in place.
    #[inline]
    pub fn save<T: Serialize>(&self, key: StorageKey, items: &[T]) -> Result<()> {
        let result = serde_json::to_string_pretty(items)
            .map_err(LedgerError::from)
            .and_then(|json| self.backend.write(key, &json));
        match result {
            Ok(()) => {
                tracing::debug!(key = %key, count = items.len(), "collection saved");
                Ok(())
            }
            Err(err) => {
                tracing::error!(key = %key, error = %err, "failed to save collection");
                Err(err)
            }
        }
    }

    define_collections! {
        clients, try_clients, save_clients, Client, Clients, "clients";
        vehicles, try_vehicles, save_vehicles, Vehicle, Vehicles, "vehicles";
        archived_vehicles, try_archived_vehicles, save_archived_vehicles, Vehicle, ArchivedVehicles, "archived vehicles";
        invoices, try_invoices, save_invoices, Invoice, Invoices, "client invoices";
        payments, try_payments, save_payments, Payment, Payments, "client payments";
        vendor_invoices, try_vendor_invoices, save_vendor_invoices, VendorInvoice, VendorInvoices, "vendor invoices";
        vendor_payments, try_vendor_payments, save_vendor_payments, VendorPayment, VendorPayments, "vendor payments";
        salary_expenses, try_salary_expenses, save_salary_expenses, SalaryExpense, SalaryExpenses, "salary expenses";
        daily_expenses, try_daily_expenses, save_daily_expenses, DailyExpense, DailyExpenses, "daily expenses";
        audit_entries, try_audit_entries, save_audit_entries, AuditEntry, AuditLog, "audit entries";
        users, try_users, save_users, UserAccount, Users, "user accounts";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceNo;

    /// Backend whose writes always fail.
    #[derive(Debug, Default)]
    struct ReadOnlyStorage {
        /// Backing data served to readers.
        inner: InMemoryStorage,
    }

    impl Storage for ReadOnlyStorage {
        fn read(&self, key: StorageKey) -> Result<Option<String>> {
            self.inner.read(key)
        }

        fn write(&self, _key: StorageKey, _contents: &str) -> Result<()> {
            Err(LedgerError::Storage("disk full".into()))
        }

        fn remove(&self, _key: StorageKey) -> Result<()> {
            Err(LedgerError::Storage("disk full".into()))
        }
    }

    /// Creates a minimal invoice.
    fn invoice(no: &str, total: f64) -> Invoice {
        Invoice {
            invoice_no: Some(InvoiceNo::from(no)),
            client_name: "Acme Logistics".to_owned(),
            total_amount: total,
            balance: Some(total),
            ..Invoice::default()
        }
    }

    #[test]
    fn load_missing_key_is_empty() {
        let store = RecordStore::new(InMemoryStorage::new());
        assert!(store.invoices().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = RecordStore::new(InMemoryStorage::new());
        let invoices = vec![invoice("INV-1", 100.0), invoice("INV-2", 250.0)];
        store.save_invoices(&invoices).unwrap();
        assert_eq!(store.invoices(), invoices);
    }

    #[test]
    fn corrupt_json_loads_as_empty() {
        let backend = InMemoryStorage::new();
        backend.write(StorageKey::Payments, "{not json").unwrap();
        let store = RecordStore::new(backend);
        assert!(store.payments().is_empty());
    }

    #[test]
    fn wrong_shape_loads_as_empty() {
        let backend = InMemoryStorage::new();
        backend
            .write(StorageKey::Clients, r#"{"clients": []}"#)
            .unwrap();
        let store = RecordStore::new(backend);
        assert!(store.clients().is_empty());
    }

    #[test]
    fn malformed_record_is_skipped_and_the_rest_survive() {
        let backend = InMemoryStorage::new();
        backend
            .write(
                StorageKey::Invoices,
                r#"[
                    {"invoiceNo": "INV-1", "totalAmount": 100},
                    "not a record",
                    {"invoiceNo": "INV-3", "totalAmount": 300, "items": 7},
                    {"invoiceNo": "INV-4", "totalAmount": "250"}
                ]"#,
            )
            .unwrap();
        let store = RecordStore::new(backend);

        let numbers: Vec<String> = store
            .invoices()
            .iter()
            .map(|stored| stored.number().to_owned())
            .collect();
        assert_eq!(numbers, ["INV-1", "INV-4"]);
    }

    #[test]
    fn strict_load_rejects_damaged_collections() {
        let backend = InMemoryStorage::new();
        backend
            .write(
                StorageKey::Invoices,
                r#"[{"invoiceNo": "INV-1", "totalAmount": 100}, "not a record"]"#,
            )
            .unwrap();
        backend.write(StorageKey::Payments, "{not json").unwrap();
        backend
            .write(StorageKey::Clients, r#"{"clients": []}"#)
            .unwrap();
        let store = RecordStore::new(backend);

        assert!(matches!(
            store.try_invoices().unwrap_err(),
            LedgerError::Serialization(_)
        ));
        assert!(store.try_payments().is_err());
        assert!(store.try_clients().is_err());
        assert!(store.try_vehicles().unwrap().is_empty());
    }

    #[test]
    fn strict_load_matches_tolerant_load_on_clean_data() {
        let store = RecordStore::new(InMemoryStorage::new());
        let invoices = vec![invoice("INV-1", 100.0), invoice("INV-2", 250.0)];
        store.save_invoices(&invoices).unwrap();
        assert_eq!(store.try_invoices().unwrap(), store.invoices());
    }

    #[test]
    fn failed_save_keeps_previous_contents() {
        let storage = ReadOnlyStorage::default();
        let previous = serde_json::to_string(&vec![invoice("INV-1", 100.0)]).unwrap();
        storage.inner.write(StorageKey::Invoices, &previous).unwrap();
        let store = RecordStore::new(storage);

        let err = store
            .save_invoices(&[invoice("INV-9", 1.0)])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));

        let loaded = store.invoices();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].number(), "INV-1");
    }

    #[test]
    fn key_names_are_unique() {
        let mut names: Vec<&str> = StorageKey::ALL.iter().map(|key| key.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StorageKey::ALL.len());
    }

    #[test]
    fn business_data_excludes_audit_and_users() {
        assert!(!StorageKey::BUSINESS_DATA.contains(&StorageKey::AuditLog));
        assert!(!StorageKey::BUSINESS_DATA.contains(&StorageKey::Users));
        assert!(!StorageKey::BUSINESS_DATA.contains(&StorageKey::SchemaVersion));
    }
}
