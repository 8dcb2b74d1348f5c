use crate::model::fields;
use crate::model::{Transaction, TransactionKind};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Normalizes a flat list or mapping of investment entries into expense transactions.
pub fn normalize_investments(snapshot: &Value) -> Vec<Transaction> {
    fields::records(snapshot)
        .into_iter()
        .filter_map(|(key, entry)| {
            let amount = fields::AMOUNT.amount(entry).abs();
            if amount.is_zero() {
                trace!("Skipping investment {key:?} without an amount");
                return None;
            }
            Some(Transaction::new(
                TransactionKind::Investment,
                fields::DATE.date(entry),
                amount,
                Arc::new(entry.clone()),
            ))
        })
        .collect()
}
