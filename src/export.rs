//! CSV export of one month of transactions.

use crate::model::Transaction;
use crate::Result;
use anyhow::Context;
use csv::Writer;

const HEADER: [&str; 4] = ["date", "kind", "amount", "note"];

/// Serializes `transactions` as CSV with the columns `date, kind, amount, note`.
///
/// `amount` is the net income of client transactions and the expense magnitude of every other
/// kind, both of which are already what a `Transaction` carries. A date that could not be parsed
/// is written as it was received, or as `Unknown` when there was none.
pub fn month_csv(transactions: &[Transaction]) -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(HEADER)?;
    for t in transactions {
        let date = match t.parsed_date() {
            Some(d) => d.format("%Y-%m-%d").to_string(),
            None if !t.raw_date().is_missing() => t.raw_date().to_string(),
            None => "Unknown".to_string(),
        };
        wtr.write_record([
            date,
            t.kind().to_string(),
            format!("{:.2}", t.amount().value()),
            t.note().unwrap_or_default(),
        ])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("The CSV output is not valid UTF-8")
}
