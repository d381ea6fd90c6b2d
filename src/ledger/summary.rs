//! Ledgers and balance summaries over a reconciled snapshot.

use super::{
    BankSources, LedgerFilter, LedgerKind, LedgerReport, LedgerTotals, accumulate, build_bank_rows,
    build_rows, filter_by_entity_and_month_range,
};
use crate::reconcile::LedgerSnapshot;

/// Client ledger: the client's invoices (debit) and payments (credit).
#[inline]
#[must_use]
pub fn client_ledger(snapshot: &LedgerSnapshot, filter: &LedgerFilter) -> LedgerReport {
    let invoices = filter_by_entity_and_month_range(&snapshot.invoices, filter);
    let payments = filter_by_entity_and_month_range(&snapshot.payments, filter);
    let rows = build_rows(&invoices, &payments, LedgerKind::Client);
    accumulate(&rows, LedgerKind::Client)
}

/// Vendor ledger: vendor invoices (credit) and vendor payments (debit).
#[inline]
#[must_use]
pub fn vendor_ledger(snapshot: &LedgerSnapshot, filter: &LedgerFilter) -> LedgerReport {
    let invoices = filter_by_entity_and_month_range(&snapshot.vendor_invoices, filter);
    let payments = filter_by_entity_and_month_range(&snapshot.vendor_payments, filter);
    let rows = build_rows(&invoices, &payments, LedgerKind::Vendor);
    accumulate(&rows, LedgerKind::Vendor)
}

/// Bank ledger: every receipt and disbursement in the month range.
///
/// The entity criterion does not apply; each source is narrowed by month
/// only.
#[inline]
#[must_use]
pub fn bank_ledger(snapshot: &LedgerSnapshot, filter: &LedgerFilter) -> LedgerReport {
    let months = filter.months_only();
    let sources = BankSources {
        payments: filter_by_entity_and_month_range(&snapshot.payments, &months),
        vendor_payments: filter_by_entity_and_month_range(&snapshot.vendor_payments, &months),
        salary_expenses: filter_by_entity_and_month_range(&snapshot.salary_expenses, &months),
        daily_expenses: filter_by_entity_and_month_range(&snapshot.daily_expenses, &months),
    };
    accumulate(&build_bank_rows(&sources), LedgerKind::Bank)
}

/// Derived balance of one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientBalance {
    /// Client display name.
    pub name: String,
    /// Client business identifier.
    pub client_id: Option<String>,
    /// Totals of the client's ledger; `balance` is the amount owed.
    pub totals: LedgerTotals,
}

/// Computes every client's balance from its ledger, in client order.
///
/// Stored `balance` fields on clients are ignored.
#[inline]
#[must_use]
pub fn client_balances(snapshot: &LedgerSnapshot) -> Vec<ClientBalance> {
    snapshot
        .clients
        .iter()
        .map(|client| {
            let filter = LedgerFilter::new().entity(client.name.as_str());
            ClientBalance {
                name: client.name.clone(),
                client_id: client.client_id.clone(),
                totals: client_ledger(snapshot, &filter).totals,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Client, DailyExpense, Invoice, InvoiceNo, Payment, SalaryExpense, VendorInvoice,
        VendorPayment, YearMonth,
    };

    /// Asserts two amounts are equal.
    fn assert_amount(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// A small two-client, one-vendor snapshot spanning January and February.
    fn snapshot() -> LedgerSnapshot {
        LedgerSnapshot {
            clients: vec![
                Client {
                    client_id: Some("CL-1".to_owned()),
                    name: "Acme Logistics".to_owned(),
                    balance: Some(123.0),
                    ..Client::default()
                },
                Client {
                    client_id: Some("CL-2".to_owned()),
                    name: "Beta Couriers".to_owned(),
                    ..Client::default()
                },
                Client {
                    client_id: Some("CL-3".to_owned()),
                    name: "Idle Transport".to_owned(),
                    ..Client::default()
                },
            ],
            invoices: vec![
                Invoice {
                    invoice_no: Some(InvoiceNo::from("INV-1")),
                    client_name: "Acme Logistics".to_owned(),
                    invoice_date: Some("2026-01-05".to_owned()),
                    total_amount: 10_000.0,
                    ..Invoice::default()
                },
                Invoice {
                    invoice_no: Some(InvoiceNo::from("INV-2")),
                    client_name: "Beta Couriers".to_owned(),
                    invoice_date: Some("2026-02-01".to_owned()),
                    total_amount: 4_000.0,
                    ..Invoice::default()
                },
            ],
            payments: vec![Payment {
                reference: Some("PAY-1".to_owned()),
                client_name: Some("Acme Logistics".to_owned()),
                total_amount: Some(6_000.0),
                payment_date: Some("2026-02-10".to_owned()),
                ..Payment::default()
            }],
            vendor_invoices: vec![VendorInvoice {
                invoice_no: Some(InvoiceNo::from("SUP-1")),
                vendor_name: "GPS Parts Ltd".to_owned(),
                invoice_date: Some("2026-01-15".to_owned()),
                total_amount: 2_000.0,
                ..VendorInvoice::default()
            }],
            vendor_payments: vec![VendorPayment {
                reference: Some("VP-1".to_owned()),
                vendor_name: Some("GPS Parts Ltd".to_owned()),
                total_amount: Some(2_000.0),
                tax_rate: Some(5.0),
                payment_date: Some("2026-02-02".to_owned()),
                ..VendorPayment::default()
            }],
            salary_expenses: vec![SalaryExpense {
                id: Some("S-1".to_owned()),
                employee_name: "J. Otieno".to_owned(),
                amount: 1_000.0,
                month: Some("January".to_owned()),
                ..SalaryExpense::default()
            }],
            daily_expenses: vec![DailyExpense {
                id: Some("E-1".to_owned()),
                amount: 250.0,
                date: Some("2026-02-20".to_owned()),
                ..DailyExpense::default()
            }],
            ..LedgerSnapshot::default()
        }
    }

    #[test]
    fn client_ledger_for_one_client() {
        let report = client_ledger(&snapshot(), &LedgerFilter::new().entity("Acme Logistics"));
        assert_eq!(report.rows.len(), 2);
        assert_amount(report.totals.balance, 4_000.0);
    }

    #[test]
    fn vendor_ledger_settles_with_withholding() {
        let report = vendor_ledger(&snapshot(), &LedgerFilter::new());
        assert_amount(report.totals.credit, 2_000.0);
        assert_amount(report.totals.debit, 1_900.0);
        assert_amount(report.totals.tax, 100.0);
        assert_amount(report.totals.balance, 0.0);
    }

    #[test]
    fn bank_ledger_ignores_entity_and_filters_months() {
        let february = YearMonth::new(2026, 2).unwrap();
        let filter = LedgerFilter::new()
            .entity("Acme Logistics")
            .since(february)
            .until(february)
            .reference_year(2026);
        let report = bank_ledger(&snapshot(), &filter);
        // Receipt 6000, vendor payment net 1900, expense 250; January salary excluded.
        assert_eq!(report.rows.len(), 3);
        assert_amount(report.totals.credit, 6_000.0);
        assert_amount(report.totals.debit, 2_150.0);
        assert_amount(report.totals.balance, 3_850.0);
    }

    #[test]
    fn client_balances_are_derived() {
        let balances = client_balances(&snapshot());
        assert_eq!(balances.len(), 3);
        assert_eq!(balances[0].name, "Acme Logistics");
        assert_amount(balances[0].totals.balance, 4_000.0);
        assert_amount(balances[1].totals.balance, 4_000.0);
        assert_eq!(balances[2].client_id.as_deref(), Some("CL-3"));
        assert_eq!(balances[2].totals, LedgerTotals::default());
    }
}
