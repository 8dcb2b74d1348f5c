use crate::model::fields::{self, Aliases};
use crate::model::{Transaction, TransactionKind};
use crate::normalize::{date_or, nested};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Normalizes agent commissions charged on facility payments.
pub fn normalize_commissions(snapshot: &Value) -> Vec<Transaction> {
    surcharges(snapshot, fields::COMMISSION, TransactionKind::Commission)
}

/// Normalizes service charges levied on facility payments.
pub fn normalize_facility_charges(snapshot: &Value) -> Vec<Transaction> {
    surcharges(snapshot, fields::SERVICE_CHARGE, TransactionKind::FacilityCharge)
}

/// Emits one transaction per facility payment whose `field` is strictly positive.
fn surcharges(snapshot: &Value, field: Aliases, kind: TransactionKind) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for (key, facility) in fields::records(snapshot) {
        let Some(payments) = nested(facility, fields::PAYMENTS) else {
            trace!("Facility {key:?} has no payments");
            continue;
        };
        let created = fields::CREATED.date(facility);
        for (_, payment) in fields::records(payments) {
            let amount = field.amount(payment);
            if !amount.is_positive() {
                continue;
            }
            let date = date_or(fields::DATE.date(payment), &created);
            transactions.push(Transaction::new(
                kind,
                date,
                amount,
                Arc::new(payment.clone()),
            ));
        }
    }
    transactions
}
