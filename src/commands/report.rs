use crate::args::{OutputFormat, ReportArgs};
use crate::commands::Out;
use crate::dashboard::{Dashboard, Summary};
use crate::ledger::ScopeTotals;
use crate::model::TransactionKind;
use crate::source::read_snapshots;
use crate::{Config, Result};
use anyhow::Context;
use std::fmt::Write;
use tracing::warn;

/// Reads every snapshot file once, runs the pipeline and returns the dashboard summary.
///
/// The most recent year and month are selected first, then `args` narrows the selection:
/// - `--year` alone shows that whole year
/// - `--month` alone picks a month within the auto-selected year
/// - both pick that exact month
pub async fn report(config: Config, args: &ReportArgs) -> Result<Out<Summary>> {
    let snapshots = read_snapshots(&config).await;
    let mut dashboard = Dashboard::new();
    dashboard.refresh(snapshots.ledger());

    if let Some(year) = args.year() {
        if !dashboard.ledger().year_keys().contains(&year) {
            warn!("There are no transactions in {year}");
        }
        dashboard.select_year(year);
        if args.month().is_none() {
            dashboard.clear_month();
        }
    }
    if let Some(month) = args.month() {
        dashboard.select_month(month.key());
    }

    let summary = dashboard.summary();
    let message = match args.format() {
        OutputFormat::Text => render_text(&summary),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&summary).context("Unable to serialize the summary")?
        }
    };
    Ok(Out::new(message, summary))
}

fn label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Client => "Income",
        TransactionKind::Investment => "Investment",
        TransactionKind::Discretionary => "Discretionary",
        TransactionKind::StaffPayroll => "Staff payroll",
        TransactionKind::WorkerPayroll => "Worker payroll",
        TransactionKind::Commission => "Commission",
        TransactionKind::FacilityCharge => "Facility charge",
    }
}

/// Renders a summary as a plain text table of Overall, Year and Month totals.
pub fn render_text(summary: &Summary) -> String {
    let mut s = String::new();
    if summary.transactions == 0 {
        s.push_str("No data");
        return s;
    }

    let years: Vec<String> = summary.years.iter().map(|y| y.to_string()).collect();
    let year = summary
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "-".to_string());
    let month = summary
        .month
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());

    // writing to a String cannot fail
    let _ = writeln!(s, "Years: {}", years.join(", "));
    let _ = writeln!(s, "Transactions: {}", summary.transactions);
    let _ = writeln!(s);
    let _ = writeln!(s, "{:<16}{:>16}{:>16}{:>16}", "", "Overall", year, month);

    let mut row = |name: &str, get: &dyn Fn(&ScopeTotals) -> String| {
        let _ = writeln!(
            s,
            "{:<16}{:>16}{:>16}{:>16}",
            name,
            get(&summary.overall),
            get(&summary.year_totals),
            get(&summary.month_totals)
        );
    };
    for kind in TransactionKind::ALL {
        row(label(kind), &|t: &ScopeTotals| t.get(kind).to_string());
    }
    row("Expense", &|t: &ScopeTotals| t.expense.to_string());
    row("Profit", &|t: &ScopeTotals| t.profit.to_string());

    s.trim_end().to_string()
}
