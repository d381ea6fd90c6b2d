//! CLI binary for browsing fleet ledgers and recording payments.

use core::time::Duration;
use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use fleetledger::allocation::{Operator, PaymentReceipt};
use fleetledger::client::{ErpClient, RemoteSource};
use fleetledger::erp::Erp;
use fleetledger::ledger::{
    ClientBalance, LedgerFilter, LedgerKind, LedgerReport, filter_by_entity_and_month_range,
};
use fleetledger::models::{
    AuditEntry, Invoice, InvoiceNo, InvoiceStatus, NaiveDate, Payment, PaymentLineItem, YearMonth,
};
use fleetledger::reconcile::LedgerSnapshot;
use fleetledger::storage::schema::{ResetConfirmation, SchemaStatus};
use fleetledger::storage::{FileStorage, Storage, StorageKey};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Environment variable holding the remote API base URL.
const API_URL_ENV: &str = "FLEETLEDGER_API_URL";

/// Environment variable holding the remote API bearer token.
const TOKEN_ENV: &str = "FLEETLEDGER_TOKEN";

/// Placeholder for empty table cells.
const EMPTY: &str = "\u{2014}";

/// Fleet ERP ledger tool: reconcile records, browse ledgers and record
/// client payments.
#[derive(Debug, Parser)]
#[command(name = "fleetledger", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Budget for remote requests, in milliseconds.
    #[arg(long, global = true, value_name = "MS", default_value_t = 2_500)]
    timeout_ms: u64,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Reconcile remote records with the local cache and save the result.
    Sync,
    /// Show a client, vendor or bank ledger with running balances.
    Ledger(LedgerArgs),
    /// List client invoices with their payment status.
    Invoices {
        /// Only show invoices of this client (exact name).
        #[arg(long)]
        client: Option<String>,
    },
    /// Record a client payment against cached invoices.
    Pay(PayArgs),
    /// Show the derived balance of every client.
    Balances,
    /// Show the most recent audit entries.
    Audit {
        /// Maximum number of entries.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Inspect or reset the local schema version.
    Schema {
        /// Schema action.
        #[command(subcommand)]
        action: SchemaAction,
    },
}

/// Ledger selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LedgerChoice {
    /// Client invoices and payments.
    Client,
    /// Vendor invoices and payments.
    Vendor,
    /// All receipts and disbursements.
    Bank,
}

impl From<LedgerChoice> for LedgerKind {
    #[inline]
    fn from(choice: LedgerChoice) -> Self {
        match choice {
            LedgerChoice::Client => Self::Client,
            LedgerChoice::Vendor => Self::Vendor,
            LedgerChoice::Bank => Self::Bank,
        }
    }
}

/// Arguments for the `ledger` subcommand.
#[derive(Debug, Args)]
struct LedgerArgs {
    /// Which ledger to show.
    #[arg(value_enum)]
    kind: LedgerChoice,
    /// Counterparty name (exact match; ignored for the bank ledger).
    #[arg(long)]
    entity: Option<String>,
    /// First month (inclusive, YYYY-MM).
    #[arg(long, value_parser = parse_month)]
    from: Option<YearMonth>,
    /// Last month (inclusive, YYYY-MM).
    #[arg(long, value_parser = parse_month)]
    to: Option<YearMonth>,
    /// Year assigned to records labelled only with a month name.
    #[arg(long)]
    year: Option<i32>,
}

/// One `--invoice NO=AMOUNT` allocation.
#[derive(Debug, Clone, PartialEq)]
struct Allocation {
    /// Invoice number.
    invoice_no: String,
    /// Amount applied to the invoice.
    amount: f64,
}

/// Arguments for the `pay` subcommand.
#[derive(Debug, Args)]
struct PayArgs {
    /// Payment reference (must be unique).
    #[arg(long)]
    reference: String,
    /// Allocation to an invoice, repeatable.
    #[arg(long = "invoice", value_name = "NO=AMOUNT", required = true, value_parser = parse_allocation)]
    allocations: Vec<Allocation>,
    /// Withholding tax rate in percent.
    #[arg(long, default_value_t = 0.0_f64)]
    tax_rate: f64,
    /// Payment method (e.g. "Bank Transfer").
    #[arg(long)]
    method: Option<String>,
    /// Payment date (YYYY-MM-DD, default today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Username recorded in the audit trail.
    #[arg(long, default_value = "admin")]
    operator: String,
}

/// Schema subcommands.
#[derive(Debug, Subcommand)]
enum SchemaAction {
    /// Compare the stored schema version with the current one.
    Check,
    /// Mark the stored data as current without changing it.
    Adopt,
    /// Wipe business data and mark the store as current.
    Reset {
        /// Confirm that business data will be deleted.
        #[arg(long)]
        yes: bool,
    },
}

/// Parses a month in `YYYY-MM` format for clap.
fn parse_month(s: &str) -> Result<YearMonth, String> {
    s.parse()
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Parses an `NO=AMOUNT` allocation for clap.
fn parse_allocation(s: &str) -> Result<Allocation, String> {
    let (number, raw_amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NO=AMOUNT, got {s:?}"))?;
    if number.trim().is_empty() {
        return Err(format!("missing invoice number in {s:?}"));
    }
    let amount: f64 = raw_amount
        .trim()
        .parse()
        .map_err(|err| format!("invalid amount in {s:?}: {err}"))?;
    Ok(Allocation {
        invoice_no: number.trim().to_owned(),
        amount,
    })
}

/// Reads a non-blank environment variable.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Prints an error line to stderr and returns a failure exit code.
fn fail(context: &str, err: &dyn core::fmt::Display) -> io::Result<ExitCode> {
    writeln!(
        io::stderr().lock(),
        "{} {context}: {err}",
        "error:".red().bold()
    )?;
    Ok(ExitCode::FAILURE)
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => return fail("failed to initialize storage", &err),
    };
    let timeout = Duration::from_millis(cli.timeout_ms);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let Some(base_url) = read_env(API_URL_ENV) else {
        tracing::debug!("{API_URL_ENV} not set, working from the local cache");
        let erp = match Erp::builder().storage(storage).timeout(timeout).build() {
            Ok(erp) => erp,
            Err(err) => return fail("failed to build ledger engine", &err),
        };
        return runtime.block_on(dispatch(&erp, cli.command));
    };

    let mut builder = ErpClient::builder().base_url(base_url);
    if let Some(token) = read_env(TOKEN_ENV) {
        builder = builder.token(token);
    }
    let client = match builder.build() {
        Ok(client) => client,
        Err(err) => return fail("failed to build API client", &err),
    };
    let erp = match Erp::builder()
        .storage(storage)
        .remote(client)
        .timeout(timeout)
        .build()
    {
        Ok(erp) => erp,
        Err(err) => return fail("failed to build ledger engine", &err),
    };
    runtime.block_on(dispatch(&erp, cli.command))
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> fleetledger::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
async fn dispatch<S: Storage, R: RemoteSource>(
    erp: &Erp<S, R>,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Sync => cmd_sync(erp).await,
        Command::Ledger(args) => cmd_ledger(erp, &args).await,
        Command::Invoices { client } => cmd_invoices(erp, client).await,
        Command::Pay(args) => cmd_pay(erp, &args),
        Command::Balances => cmd_balances(erp).await,
        Command::Audit { limit } => print_audit_table(&erp.audit_log(limit)),
        Command::Schema { action } => cmd_schema(erp, action),
    }
}

/// Executes the `sync` subcommand.
async fn cmd_sync<S: Storage, R: RemoteSource>(erp: &Erp<S, R>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Reconciling with the ERP API...");
    let result = erp.sync().await;
    spinner.finish_and_clear();
    match result {
        Ok(snapshot) => {
            print_sync_summary(&snapshot)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("sync failed", &err),
    }
}

/// Builds a [`LedgerFilter`] from CLI arguments.
fn build_ledger_filter(args: &LedgerArgs) -> Result<LedgerFilter, String> {
    if let (Some(from), Some(to)) = (args.from, args.to)
        && from > to
    {
        return Err(format!("--from {from} is after --to {to}"));
    }
    let mut filter = LedgerFilter::new();
    if let Some(name) = args.entity.as_deref() {
        filter = filter.entity(name);
    }
    if let Some(from) = args.from {
        filter = filter.since(from);
    }
    if let Some(to) = args.to {
        filter = filter.until(to);
    }
    if let Some(year) = args.year {
        filter = filter.reference_year(year);
    }
    Ok(filter)
}

/// Executes the `ledger` subcommand.
async fn cmd_ledger<S: Storage, R: RemoteSource>(
    erp: &Erp<S, R>,
    args: &LedgerArgs,
) -> io::Result<ExitCode> {
    let filter = match build_ledger_filter(args) {
        Ok(filter) => filter,
        Err(message) => return fail("invalid month range", &message),
    };
    let spinner = make_spinner("Building ledger...");
    let report = erp.ledger(args.kind.into(), &filter).await;
    spinner.finish_and_clear();
    print_ledger_table(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `invoices` subcommand.
async fn cmd_invoices<S: Storage, R: RemoteSource>(
    erp: &Erp<S, R>,
    client: Option<String>,
) -> io::Result<ExitCode> {
    let spinner = make_spinner("Loading invoices...");
    let snapshot = erp.snapshot().await;
    spinner.finish_and_clear();
    let filter = client.map_or_else(LedgerFilter::new, |name| LedgerFilter::new().entity(name));
    let invoices = filter_by_entity_and_month_range(&snapshot.invoices, &filter);
    print_invoices_table(&invoices)?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the payment described by the `pay` arguments.
fn build_payment(args: &PayArgs, today: NaiveDate) -> Payment {
    let total = args
        .allocations
        .iter()
        .map(|allocation| allocation.amount)
        .sum::<f64>();
    Payment {
        reference: Some(args.reference.clone()),
        total_amount: Some(total),
        tax_rate: Some(args.tax_rate),
        method: args.method.clone(),
        payment_date: Some(args.date.unwrap_or(today).to_string()),
        line_items: args
            .allocations
            .iter()
            .map(|allocation| PaymentLineItem {
                invoice_no: Some(InvoiceNo::from(allocation.invoice_no.as_str())),
                allocated_amount: allocation.amount,
                ..PaymentLineItem::default()
            })
            .collect(),
        ..Payment::default()
    }
}

/// Executes the `pay` subcommand.
fn cmd_pay<S: Storage, R: RemoteSource>(erp: &Erp<S, R>, args: &PayArgs) -> io::Result<ExitCode> {
    let payment = build_payment(args, Utc::now().date_naive());
    match erp.record_payment(payment, &Operator::new(args.operator.as_str())) {
        Ok(receipt) => {
            print_receipt(&receipt)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => fail("payment rejected", &err),
    }
}

/// Executes the `balances` subcommand.
async fn cmd_balances<S: Storage, R: RemoteSource>(erp: &Erp<S, R>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Computing client balances...");
    let balances = erp.client_balances().await;
    spinner.finish_and_clear();
    print_balances_table(&balances)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `schema` subcommand.
fn cmd_schema<S: Storage, R: RemoteSource>(
    erp: &Erp<S, R>,
    action: SchemaAction,
) -> io::Result<ExitCode> {
    let mut out = io::stdout().lock();
    match action {
        SchemaAction::Check => match erp.schema_status() {
            Ok(SchemaStatus::Current) => {
                writeln!(out, "{}", "Schema is current.".green().bold())?;
                Ok(ExitCode::SUCCESS)
            }
            Ok(SchemaStatus::Mismatch { stored, target }) => {
                let stored_label = stored.as_deref().unwrap_or("none");
                writeln!(
                    out,
                    "{} stored version {stored_label}, current version {target}",
                    "Schema mismatch:".yellow().bold()
                )?;
                writeln!(
                    out,
                    "  {} `schema adopt` keeps the data, `schema reset --yes` wipes it",
                    "hint:".cyan()
                )?;
                Ok(ExitCode::FAILURE)
            }
            Err(err) => fail("failed to read schema version", &err),
        },
        SchemaAction::Adopt => match erp.adopt_schema() {
            Ok(()) => {
                writeln!(out, "{}", "Schema marked as current.".green().bold())?;
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => fail("failed to write schema version", &err),
        },
        SchemaAction::Reset { yes: false } => fail(
            "refusing to reset",
            &"business data would be deleted; pass --yes to confirm",
        ),
        SchemaAction::Reset { yes: true } => {
            match erp.reset_schema(ResetConfirmation::acknowledge_data_loss()) {
                Ok(report) => {
                    let wiped: Vec<&str> = report.wiped.iter().copied().map(StorageKey::name).collect();
                    writeln!(
                        out,
                        "{} {}",
                        "Business data wiped.".green().bold(),
                        format_args!("({})", wiped.join(", ")).dimmed()
                    )?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => fail("reset failed", &err),
            }
        }
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Formats an amount, leaving zero cells blank.
fn amount_cell(amount: f64, color: Color) -> Cell {
    if amount.abs() > f64::EPSILON {
        Cell::new(format!("{amount:.2}")).fg(color)
    } else {
        Cell::new(EMPTY).fg(Color::DarkGrey)
    }
}

/// Color used for an invoice status.
const fn status_color(status: InvoiceStatus) -> Color {
    match status {
        InvoiceStatus::Pending => Color::Red,
        InvoiceStatus::Partial => Color::Yellow,
        InvoiceStatus::Paid => Color::Green,
    }
}

/// Creates a table with the standard preset and a cyan header.
fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(
        header
            .iter()
            .map(|title| Cell::new(title).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    table
}

/// Prints the collection counts of a reconciled snapshot.
fn print_sync_summary(snapshot: &LedgerSnapshot) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Sync complete!".green().bold())?;
    writeln!(out)?;

    let mut table = new_table(&["Collection", "Records"]);
    let rows: &[(&str, usize)] = &[
        ("Clients", snapshot.clients.len()),
        ("Vehicles", snapshot.vehicles.len()),
        ("Invoices", snapshot.invoices.len()),
        ("Payments", snapshot.payments.len()),
        ("Vendor Invoices", snapshot.vendor_invoices.len()),
        ("Vendor Payments", snapshot.vendor_payments.len()),
        ("Salary Expenses", snapshot.salary_expenses.len()),
        ("Daily Expenses", snapshot.daily_expenses.len()),
    ];
    for &(name, count) in rows {
        let count_cell = if count > 0 {
            Cell::new(count).fg(Color::Green)
        } else {
            Cell::new(count).fg(Color::DarkGrey)
        };
        _ = table.add_row(vec![Cell::new(name), count_cell]);
    }

    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints a ledger with running balances and totals.
fn print_ledger_table(report: &LedgerReport) -> io::Result<()> {
    let mut out = io::stdout().lock();
    let title = format!("{} Ledger", report.kind.label());
    if report.rows.is_empty() {
        writeln!(out, "{}", format!("{title}: no entries found.").dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&[
        "Date", "Type", "Reference", "Details", "Debit", "Credit", "Tax", "Balance",
    ]);
    for balanced in &report.rows {
        let row = &balanced.row;
        let date = row
            .date
            .map_or_else(|| EMPTY.to_owned(), |date| date.to_string());
        _ = table.add_row(vec![
            Cell::new(date),
            Cell::new(row.kind.label()),
            Cell::new(&row.reference),
            Cell::new(&row.details),
            amount_cell(row.debit, Color::Red),
            amount_cell(row.credit, Color::Green),
            amount_cell(row.tax_deduction, Color::Yellow),
            Cell::new(format!("{:.2}", balanced.balance)),
        ]);
    }
    let totals = report.totals;
    _ = table.add_row(vec![
        Cell::new("Total").fg(Color::Cyan),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{:.2}", totals.debit)),
        Cell::new(format!("{:.2}", totals.credit)),
        Cell::new(format!("{:.2}", totals.tax)),
        Cell::new(format!("{:.2}", totals.balance)).fg(Color::Cyan),
    ]);

    writeln!(
        out,
        "{} {}",
        title.green().bold(),
        format_args!("({})", report.rows.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints invoices in a table.
fn print_invoices_table(invoices: &[&Invoice]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if invoices.is_empty() {
        writeln!(out, "{}", "No invoices found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&[
        "Invoice", "Client", "Date", "Total", "Paid", "Balance", "Status",
    ]);
    for invoice in invoices {
        let balance = invoice.outstanding();
        let status = InvoiceStatus::for_amounts(balance, invoice.paid_amount);
        _ = table.add_row(vec![
            Cell::new(invoice.number()),
            Cell::new(&invoice.client_name),
            Cell::new(invoice.invoice_date.as_deref().unwrap_or(EMPTY)),
            Cell::new(format!("{:.2}", invoice.total_amount)),
            Cell::new(format!("{:.2}", invoice.paid_amount)),
            Cell::new(format!("{balance:.2}")),
            Cell::new(status).fg(status_color(status)),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Invoices".green().bold(),
        format_args!("({})", invoices.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the outcome of a recorded payment.
fn print_receipt(receipt: &PaymentReceipt) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} {}",
        "Payment recorded:".green().bold(),
        receipt.reference.bold()
    )?;
    writeln!(
        out,
        "  gross {:.2}, tax {:.2}, net {:.2}",
        receipt.amounts.raw_amount, receipt.amounts.tax_deduction, receipt.amounts.net_credit
    )?;
    writeln!(out)?;

    let mut table = new_table(&["Invoice", "Allocated", "Paid", "Balance", "Status"]);
    for transition in &receipt.transitions {
        _ = table.add_row(vec![
            Cell::new(&transition.invoice_no),
            Cell::new(format!("{:.2}", transition.amount)),
            Cell::new(format!("{:.2}", transition.paid_amount)),
            Cell::new(format!("{:.2}", transition.balance)),
            Cell::new(format!("{} \u{2192} {}", transition.from, transition.to))
                .fg(status_color(transition.to)),
        ]);
    }
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints client balances in a table.
fn print_balances_table(balances: &[ClientBalance]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if balances.is_empty() {
        writeln!(out, "{}", "No clients found.".dimmed())?;
        return Ok(());
    }

    let mut table = new_table(&["Client", "ID", "Invoiced", "Received", "Tax", "Balance"]);
    for balance in balances {
        let owed = balance.totals.balance;
        let owed_cell = if owed > f64::EPSILON {
            Cell::new(format!("{owed:.2}")).fg(Color::Red)
        } else {
            Cell::new(format!("{owed:.2}")).fg(Color::Green)
        };
        _ = table.add_row(vec![
            Cell::new(&balance.name),
            Cell::new(balance.client_id.as_deref().unwrap_or(EMPTY)),
            Cell::new(format!("{:.2}", balance.totals.debit)),
            Cell::new(format!("{:.2}", balance.totals.credit)),
            Cell::new(format!("{:.2}", balance.totals.tax)),
            owed_cell,
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Client Balances".green().bold(),
        format_args!("({})", balances.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints audit entries in a table.
fn print_audit_table(entries: &[AuditEntry]) -> io::Result<ExitCode> {
    let mut out = io::stdout().lock();
    if entries.is_empty() {
        writeln!(out, "{}", "Audit log is empty.".dimmed())?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = new_table(&["Time", "Action", "Kind", "By", "Details"]);
    for entry in entries {
        _ = table.add_row(vec![
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(entry.action),
            Cell::new(&entry.kind),
            Cell::new(&entry.performed_by),
            Cell::new(entry.details.as_deref().unwrap_or("")),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Audit Log".green().bold(),
        format_args!("({})", entries.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(ExitCode::SUCCESS)
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // If stderr itself failed, nothing more can be reported.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use fleetledger::client::Offline;
    use fleetledger::storage::InMemoryStorage;

    /// Creates an offline engine with one pending invoice.
    fn erp_with_invoice() -> Erp<InMemoryStorage, Offline> {
        let erp = Erp::builder()
            .storage(InMemoryStorage::new())
            .build()
            .unwrap();
        erp.store()
            .save_invoices(&[Invoice {
                invoice_no: Some(InvoiceNo::from("CT0002")),
                client_name: "Acme Logistics".to_owned(),
                invoice_date: Some("2026-02-01".to_owned()),
                total_amount: 89_625.0,
                ..Invoice::default()
            }])
            .unwrap();
        erp
    }

    /// Parses a full command line.
    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(core::iter::once("fleetledger").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parse_month_accepts_year_month() {
        assert_eq!(parse_month("2026-02").unwrap(), YearMonth::new(2026, 2).unwrap());
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("2026-02-01").is_err());
    }

    #[test]
    fn parse_allocation_splits_number_and_amount() {
        let allocation = parse_allocation("CT0002=89625.50").unwrap();
        assert_eq!(allocation.invoice_no, "CT0002");
        assert!((allocation.amount - 89_625.5).abs() < f64::EPSILON);
        assert!(parse_allocation("CT0002").is_err());
        assert!(parse_allocation("=100").is_err());
        assert!(parse_allocation("CT0002=lots").is_err());
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2026-02-05").is_ok());
        assert!(parse_date("05/02/2026").is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = parse(&["balances"]);
        assert_eq!(cli.timeout_ms, 2_500);
        assert!(cli.data_dir.is_none());
        assert!(matches!(cli.command, Command::Balances));
    }

    #[test]
    fn pay_requires_an_allocation() {
        let result = Cli::try_parse_from(["fleetledger", "pay", "--reference", "PAY-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn build_payment_totals_allocations() {
        let cli = parse(&[
            "pay",
            "--reference",
            "PAY-9",
            "--invoice",
            "INV-1=600",
            "--invoice",
            "INV-2=400",
            "--tax-rate",
            "5",
        ]);
        let Command::Pay(args) = cli.command else {
            panic!("expected pay command");
        };
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let payment = build_payment(&args, today);
        assert_eq!(payment.total_amount, Some(1_000.0));
        assert_eq!(payment.tax_rate, Some(5.0));
        assert_eq!(payment.payment_date.as_deref(), Some("2026-03-01"));
        assert_eq!(payment.line_items.len(), 2);
        assert_eq!(args.operator, "admin");
    }

    #[test]
    fn ledger_filter_rejects_inverted_range() {
        let cli = parse(&["ledger", "client", "--from", "2026-03", "--to", "2026-01"]);
        let Command::Ledger(args) = cli.command else {
            panic!("expected ledger command");
        };
        assert!(build_ledger_filter(&args).is_err());

        let cli = parse(&["ledger", "bank", "--from", "2026-01", "--year", "2025"]);
        let Command::Ledger(args) = cli.command else {
            panic!("expected ledger command");
        };
        let filter = build_ledger_filter(&args).unwrap();
        assert_eq!(filter.from, YearMonth::new(2026, 1));
        assert_eq!(filter.reference_year, 2025);
        assert_eq!(LedgerKind::from(args.kind), LedgerKind::Bank);
    }

    #[tokio::test]
    async fn pay_command_settles_invoice() {
        let erp = erp_with_invoice();
        let cli = parse(&[
            "pay",
            "--reference",
            "PAY-CT0002",
            "--invoice",
            "CT0002=89625",
            "--date",
            "2026-02-05",
        ]);
        let code = dispatch(&erp, cli.command).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        let invoices = erp.store().invoices();
        assert_eq!(invoices[0].status, InvoiceStatus::Paid);
        assert_eq!(erp.audit_log(5).len(), 1);
    }

    #[tokio::test]
    async fn over_allocation_fails_without_changes() {
        let erp = erp_with_invoice();
        let cli = parse(&[
            "pay",
            "--reference",
            "PAY-X",
            "--invoice",
            "CT0002=100000",
        ]);
        let code = dispatch(&erp, cli.command).await.unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(erp.store().payments().is_empty());
        assert!(erp.store().invoices()[0].paid_amount.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn schema_reset_requires_confirmation() {
        let erp = erp_with_invoice();
        let refused = dispatch(&erp, parse(&["schema", "reset"]).command)
            .await
            .unwrap();
        assert_eq!(refused, ExitCode::FAILURE);
        assert_eq!(erp.store().invoices().len(), 1);

        let done = dispatch(&erp, parse(&["schema", "reset", "--yes"]).command)
            .await
            .unwrap();
        assert_eq!(done, ExitCode::SUCCESS);
        assert!(erp.store().invoices().is_empty());
        let checked = dispatch(&erp, parse(&["schema", "check"]).command)
            .await
            .unwrap();
        assert_eq!(checked, ExitCode::SUCCESS);
    }
}
