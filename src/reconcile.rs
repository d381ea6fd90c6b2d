//! Reconciliation of remote and cached collections.
//!
//! Remote records come first, cached records second; duplicates are
//! removed by natural key keeping the first occurrence. The remote side
//! is always best-effort: a failed, malformed or late response simply
//! contributes nothing.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    Client, DailyExpense, Invoice, InvoiceNo, Payment, RegistrationNo, SalaryExpense, UserAccount,
    Vehicle, VendorInvoice, VendorPayment,
};
use crate::storage::{RecordStore, Storage};

/// Field used to recognize the same record across sources.
pub trait NaturalKey {
    /// Returns the record's natural key, or `None` if it has none (blank
    /// keys count as missing).
    fn natural_key(&self) -> Option<&str>;
}

/// Treats blank strings as absent.
fn present(key: Option<&str>) -> Option<&str> {
    key.filter(|text| !text.trim().is_empty())
}

impl NaturalKey for Client {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.client_id.as_deref())
            .or_else(|| present(self.id.as_deref()))
            .or_else(|| present(Some(self.name.as_str())))
    }
}

impl NaturalKey for Vehicle {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.registration_no.as_ref().map(RegistrationNo::as_inner))
            .or_else(|| present(self.id.as_deref()))
    }
}

impl NaturalKey for Invoice {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.invoice_no.as_ref().map(InvoiceNo::as_inner))
    }
}

impl NaturalKey for Payment {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.reference.as_deref())
            .or_else(|| present(self.payment_reference.as_deref()))
            .or_else(|| present(self.id.as_deref()))
    }
}

impl NaturalKey for VendorInvoice {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.invoice_no.as_ref().map(InvoiceNo::as_inner))
            .or_else(|| present(self.id.as_deref()))
    }
}

impl NaturalKey for VendorPayment {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.reference.as_deref())
            .or_else(|| present(self.payment_reference.as_deref()))
            .or_else(|| present(self.id.as_deref()))
    }
}

impl NaturalKey for SalaryExpense {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.id.as_deref())
    }
}

impl NaturalKey for DailyExpense {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.id.as_deref())
    }
}

impl NaturalKey for UserAccount {
    #[inline]
    fn natural_key(&self) -> Option<&str> {
        present(self.id.as_deref()).or_else(|| present(Some(self.username.as_str())))
    }
}

/// Concatenates `remote` and `local` and removes duplicates by natural
/// key, keeping the first occurrence. Records without a key are dropped.
#[inline]
#[must_use]
pub fn merge<T: NaturalKey>(remote: Vec<T>, local: Vec<T>) -> Vec<T> {
    let mut seen: HashSet<String> = HashSet::with_capacity(remote.len() + local.len());
    let mut merged = Vec::with_capacity(remote.len() + local.len());
    let mut keyless = 0_usize;
    for record in remote.into_iter().chain(local) {
        let Some(key) = record.natural_key().map(str::to_owned) else {
            keyless += 1;
            continue;
        };
        if seen.insert(key) {
            merged.push(record);
        }
    }
    if keyless > 0 {
        tracing::debug!(dropped = keyless, "dropped records without a natural key");
    }
    merged
}

/// Decodes raw records one by one, skipping (and logging) malformed ones.
///
/// `entity` labels the collection in the log (e.g. `"invoices"`).
#[inline]
#[must_use]
pub fn decode_records<T: DeserializeOwned>(entity: &str, raw: Vec<Value>) -> Vec<T> {
    let total = raw.len();
    let decoded: Vec<T> = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            serde_json::from_value(value)
                .map_err(|err| {
                    tracing::warn!(entity, index, error = %err, "skipping malformed record");
                })
                .ok()
        })
        .collect();
    tracing::debug!(entity, total, decoded = decoded.len(), "decoded records");
    decoded
}

/// One consistent view of every collection the ledgers are built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerSnapshot {
    /// Clients.
    pub clients: Vec<Client>,
    /// Active vehicles.
    pub vehicles: Vec<Vehicle>,
    /// Client invoices.
    pub invoices: Vec<Invoice>,
    /// Client payments.
    pub payments: Vec<Payment>,
    /// Vendor invoices.
    pub vendor_invoices: Vec<VendorInvoice>,
    /// Vendor payments.
    pub vendor_payments: Vec<VendorPayment>,
    /// Salary disbursements.
    pub salary_expenses: Vec<SalaryExpense>,
    /// Daily expenses.
    pub daily_expenses: Vec<DailyExpense>,
}

impl LedgerSnapshot {
    /// Loads a snapshot from the local cache only.
    #[inline]
    #[must_use]
    pub fn from_store<S: Storage>(store: &RecordStore<S>) -> Self {
        Self {
            clients: store.clients(),
            vehicles: store.vehicles(),
            invoices: store.invoices(),
            payments: store.payments(),
            vendor_invoices: store.vendor_invoices(),
            vendor_payments: store.vendor_payments(),
            salary_expenses: store.salary_expenses(),
            daily_expenses: store.daily_expenses(),
        }
    }

    /// Persists the remotely-served collections into `store`.
    ///
    /// The snapshot was merged from tolerant loads, so nothing is written
    /// unless all four stored collections still read back in full.
    /// Otherwise the records skipped while loading would be lost.
    ///
    /// # Errors
    ///
    /// Returns an error without writing anything if a stored collection is
    /// damaged. Otherwise returns the first save error; collections saved
    /// before it stay saved.
    #[inline]
    pub fn persist_remote_collections<S: Storage>(&self, store: &RecordStore<S>) -> Result<()> {
        let _clients = store.try_clients()?;
        let _vehicles = store.try_vehicles()?;
        let _invoices = store.try_invoices()?;
        let _payments = store.try_payments()?;
        store.save_clients(&self.clients)?;
        store.save_vehicles(&self.vehicles)?;
        store.save_invoices(&self.invoices)?;
        store.save_payments(&self.payments)
    }
}

#[cfg(feature = "remote")]
pub use remote::{Deadline, fetch_reconciled, fetch_remote, fetch_snapshot};

#[cfg(feature = "remote")]
mod remote {
    //! Deadline-bounded remote fetching.

    use core::time::Duration;

    use serde::de::DeserializeOwned;
    use tokio::time::Instant;

    use super::{LedgerSnapshot, NaturalKey, decode_records, merge};
    use crate::client::{RemoteEntity, RemoteSource};
    use crate::error::LedgerError;
    use crate::models::{Client, Invoice, Payment, Vehicle};
    use crate::storage::{RecordStore, Storage};

    /// Point in time after which remote results are abandoned.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Deadline(Instant);

    impl Deadline {
        /// Default budget for remote fetches.
        pub const DEFAULT_BUDGET: Duration = Duration::from_millis(2_500);

        /// A deadline `budget` from now.
        #[inline]
        #[must_use]
        pub fn after(budget: Duration) -> Self {
            Self(Instant::now() + budget)
        }

        /// The underlying instant.
        #[inline]
        #[must_use]
        pub const fn instant(self) -> Instant {
            self.0
        }

        /// Returns `true` once the deadline has passed.
        #[inline]
        #[must_use]
        pub fn is_expired(self) -> bool {
            Instant::now() >= self.0
        }
    }

    /// Fetches and decodes one remote collection, or returns an empty one if
    /// the request fails or misses the deadline.
    #[inline]
    #[tracing::instrument(skip_all, fields(entity = %entity))]
    pub async fn fetch_remote<T, R>(source: &R, entity: RemoteEntity, deadline: Deadline) -> Vec<T>
    where
        T: DeserializeOwned,
        R: RemoteSource,
    {
        match tokio::time::timeout_at(deadline.instant(), source.fetch(entity)).await {
            Ok(Ok(raw)) => decode_records(entity.name(), raw),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "remote fetch failed, using local cache");
                Vec::new()
            }
            Err(_elapsed) => {
                let err = LedgerError::Timeout {
                    entity: entity.name().to_owned(),
                };
                tracing::warn!(error = %err, "using local cache");
                Vec::new()
            }
        }
    }

    /// Fetches one remote collection and reconciles it with `local`.
    #[inline]
    pub async fn fetch_reconciled<T, R>(
        source: &R,
        entity: RemoteEntity,
        local: Vec<T>,
        deadline: Deadline,
    ) -> Vec<T>
    where
        T: DeserializeOwned + NaturalKey,
        R: RemoteSource,
    {
        let remote = fetch_remote(source, entity, deadline).await;
        merge(remote, local)
    }

    /// Fetches every remote collection concurrently and reconciles each
    /// with the local cache once all have settled.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub async fn fetch_snapshot<R, S>(
        source: &R,
        store: &RecordStore<S>,
        deadline: Deadline,
    ) -> LedgerSnapshot
    where
        R: RemoteSource,
        S: Storage,
    {
        let (clients, vehicles, invoices, payments) = tokio::join!(
            fetch_remote::<Client, R>(source, RemoteEntity::Clients, deadline),
            fetch_remote::<Vehicle, R>(source, RemoteEntity::Vehicles, deadline),
            fetch_remote::<Invoice, R>(source, RemoteEntity::Invoices, deadline),
            fetch_remote::<Payment, R>(source, RemoteEntity::Payments, deadline),
        );
        let snapshot = LedgerSnapshot {
            clients: merge(clients, store.clients()),
            vehicles: merge(vehicles, store.vehicles()),
            invoices: merge(invoices, store.invoices()),
            payments: merge(payments, store.payments()),
            vendor_invoices: store.vendor_invoices(),
            vendor_payments: store.vendor_payments(),
            salary_expenses: store.salary_expenses(),
            daily_expenses: store.daily_expenses(),
        };
        tracing::debug!(
            clients = snapshot.clients.len(),
            vehicles = snapshot.vehicles.len(),
            invoices = snapshot.invoices.len(),
            payments = snapshot.payments.len(),
            "snapshot reconciled"
        );
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageKey;
    use serde_json::json;

    /// Creates an invoice with the given number.
    fn invoice(no: &str, total: f64) -> Invoice {
        Invoice {
            invoice_no: Some(InvoiceNo::from(no)),
            client_name: "Acme Logistics".to_owned(),
            total_amount: total,
            ..Invoice::default()
        }
    }

    #[test]
    fn merge_has_union_size() {
        let remote = vec![invoice("A", 1.0), invoice("B", 2.0), invoice("C", 3.0)];
        let local = vec![invoice("B", 20.0), invoice("D", 4.0), invoice("A", 10.0)];
        let merged = merge(remote, local);
        let keys: Vec<&str> = merged.iter().map(Invoice::number).collect();
        assert_eq!(keys, ["A", "B", "C", "D"]);
    }

    #[test]
    fn merge_prefers_remote_copy() {
        let merged = merge(vec![invoice("A", 1.0)], vec![invoice("A", 99.0)]);
        assert_eq!(merged.len(), 1);
        assert!((merged[0].total_amount - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_deduplicates_within_one_side() {
        let merged = merge(Vec::new(), vec![invoice("A", 1.0), invoice("A", 2.0)]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn merge_drops_keyless_records() {
        let keyless = Invoice::default();
        let blank = invoice("  ", 5.0);
        let merged = merge(vec![keyless], vec![blank, invoice("A", 1.0)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].number(), "A");
    }

    #[test]
    fn payment_key_precedence() {
        let payment = Payment {
            id: Some("17".to_owned()),
            payment_reference: Some("PR-17".to_owned()),
            ..Payment::default()
        };
        assert_eq!(payment.natural_key(), Some("PR-17"));
        let by_id = Payment {
            id: Some("17".to_owned()),
            ..Payment::default()
        };
        assert_eq!(by_id.natural_key(), Some("17"));
    }

    #[test]
    fn client_key_falls_back_to_name() {
        let client = Client {
            name: "Acme Logistics".to_owned(),
            ..Client::default()
        };
        assert_eq!(client.natural_key(), Some("Acme Logistics"));
        let with_id = Client {
            client_id: Some("CL-001".to_owned()),
            id: Some("3".to_owned()),
            ..client
        };
        assert_eq!(with_id.natural_key(), Some("CL-001"));
    }

    #[test]
    fn decode_skips_malformed_records() {
        let raw = vec![
            json!({"invoiceNo": "A", "totalAmount": 10}),
            json!("garbage"),
            json!({"invoiceNo": "B", "items": "not a list"}),
            json!({"invoiceNo": "C", "totalAmount": "12.5"}),
        ];
        let decoded: Vec<Invoice> = decode_records("invoices", raw);
        let keys: Vec<&str> = decoded.iter().map(Invoice::number).collect();
        assert_eq!(keys, ["A", "C"]);
    }

    #[test]
    fn persist_refuses_to_overwrite_damaged_collections() {
        let backend = crate::storage::InMemoryStorage::new();
        let damaged = r#"[{"paymentReference": "OLD-1", "amount": 500}, 42]"#;
        backend.write(StorageKey::Payments, damaged).unwrap();
        let store = RecordStore::new(backend);

        let snapshot = LedgerSnapshot {
            invoices: vec![invoice("INV-1", 100.0)],
            payments: store.payments(),
            ..LedgerSnapshot::default()
        };
        assert_eq!(snapshot.payments.len(), 1);
        assert!(snapshot.persist_remote_collections(&store).is_err());

        assert_eq!(
            store.backend().read(StorageKey::Payments).unwrap().as_deref(),
            Some(damaged)
        );
        assert!(store.invoices().is_empty());
    }

    #[test]
    fn persist_writes_clean_collections() {
        let store = RecordStore::new(crate::storage::InMemoryStorage::new());
        let snapshot = LedgerSnapshot {
            invoices: vec![invoice("INV-1", 100.0)],
            ..LedgerSnapshot::default()
        };
        snapshot.persist_remote_collections(&store).unwrap();
        assert_eq!(store.invoices(), snapshot.invoices);
    }

    #[test]
    fn snapshot_from_empty_store_is_empty() {
        let store = RecordStore::new(crate::storage::InMemoryStorage::new());
        assert_eq!(LedgerSnapshot::from_store(&store), LedgerSnapshot::default());
    }

    #[cfg(feature = "remote")]
    mod remote {
        use core::time::Duration;

        use serde_json::{Value, json};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        use super::invoice;
        use crate::client::{ErpClient, RemoteEntity, RemoteSource};
        use crate::error::Result;
        use crate::models::Invoice;
        use crate::reconcile::{Deadline, fetch_reconciled, fetch_snapshot};
        use crate::storage::{InMemoryStorage, RecordStore};

        /// Source that answers only after a long delay.
        #[derive(Debug)]
        struct SlowSource;

        impl RemoteSource for SlowSource {
            async fn fetch(&self, _entity: RemoteEntity) -> Result<Vec<Value>> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(vec![json!({"invoiceNo": "LATE"})])
            }
        }

        #[tokio::test]
        async fn late_remote_falls_back_to_local() {
            let deadline = Deadline::after(Duration::from_millis(20));
            let local = vec![invoice("LOCAL-1", 100.0)];
            let merged: Vec<Invoice> =
                fetch_reconciled(&SlowSource, RemoteEntity::Invoices, local, deadline).await;
            assert_eq!(merged.len(), 1);
            assert_eq!(merged[0].number(), "LOCAL-1");
            assert!(deadline.is_expired());
        }

        #[tokio::test]
        async fn snapshot_settles_each_entity_independently() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/api/invoices"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "invoices": [
                        {"invoiceNo": "R-1", "clientName": "Acme Logistics", "totalAmount": 500},
                        {"invoiceNo": "L-1", "clientName": "Acme Logistics", "totalAmount": 999}
                    ]
                })))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/api/payments"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/api/clients"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!([{"clientId": "CL-1", "name": "Acme Logistics"}])),
                )
                .mount(&server)
                .await;

            let store = RecordStore::new(InMemoryStorage::new());
            store
                .save_invoices(&[invoice("L-1", 100.0), invoice("L-2", 200.0)])
                .unwrap();
            store
                .save_payments(&[crate::models::Payment {
                    reference: Some("PAY-1".to_owned()),
                    ..crate::models::Payment::default()
                }])
                .unwrap();

            let client = ErpClient::builder().base_url(server.uri()).build().unwrap();
            let snapshot =
                fetch_snapshot(&client, &store, Deadline::after(Duration::from_secs(5))).await;

            let keys: Vec<&str> = snapshot.invoices.iter().map(Invoice::number).collect();
            assert_eq!(keys, ["R-1", "L-1", "L-2"]);
            assert!((snapshot.invoices[1].total_amount - 999.0).abs() < f64::EPSILON);
            assert_eq!(snapshot.payments.len(), 1);
            assert_eq!(snapshot.clients.len(), 1);
            assert!(snapshot.vehicles.is_empty());
        }
    }
}
