use crate::model::fields::{self, BALANCE_FLAG, ENTRY_TYPE, PAID_AMOUNT, REFUND_AMOUNT, REFUND_FLAG};
use crate::model::{Amount, Transaction, TransactionKind};
use crate::normalize::{date_or, nested};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

const REFUND_TYPES: &[&str] = &["refund"];
const BALANCE_TYPES: &[&str] = &["balance", "balance_adjustment", "balanceAdjustment"];

/// Normalizes client records into income transactions.
///
/// Every entry of a client's payments collection yields its net income. Separately, every entry of
/// the client's payment log that carries a refund amount yields a negative transaction, so a refund
/// may be recorded inline on a payment, as its own log entry, or both.
pub fn normalize_clients(snapshot: &Value) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for (key, client) in fields::records(snapshot) {
        let created = fields::CREATED.date(client);

        if let Some(payments) = nested(client, fields::PAYMENTS) {
            for (_, payment) in fields::records(payments) {
                let amount = net_income(payment);
                if amount.is_zero() {
                    trace!("Skipping zero-value payment of client {key:?}");
                    continue;
                }
                let date = date_or(fields::DATE.date(payment), &created);
                transactions.push(Transaction::new(
                    TransactionKind::Client,
                    date,
                    amount,
                    Arc::new(payment.clone()),
                ));
            }
        }

        if let Some(logs) = nested(client, fields::PAYMENT_LOGS) {
            for (_, entry) in fields::records(logs) {
                let refund = REFUND_AMOUNT.amount(entry).abs();
                if !refund.is_positive() {
                    continue;
                }
                let date = date_or(fields::DATE.date(entry), &created);
                transactions.push(Transaction::new(
                    TransactionKind::Client,
                    date,
                    -refund,
                    Arc::new(entry.clone()),
                ));
            }
        }
    }
    transactions
}

/// The paid amount minus any refund on the same entry. Balance adjustments always count their paid
/// amount as positive income.
fn net_income(payment: &Value) -> Amount {
    let paid = PAID_AMOUNT.amount(payment);
    if BALANCE_FLAG.flag(payment) || ENTRY_TYPE.is_one_of(payment, BALANCE_TYPES) {
        return paid.abs();
    }
    let refund = REFUND_AMOUNT.amount(payment).abs();
    let flagged = REFUND_FLAG.flag(payment) || ENTRY_TYPE.is_one_of(payment, REFUND_TYPES);
    if !refund.is_zero() {
        paid - refund
    } else if flagged {
        // a refund entry without a separate refund amount refunds its own paid amount
        -paid.abs()
    } else {
        paid
    }
}
