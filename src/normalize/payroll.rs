use crate::model::fields;
use crate::model::{Transaction, TransactionKind};
use crate::normalize::{date_or, nested};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Normalizes office staff records and their salary payments.
pub fn normalize_staff_payroll(snapshot: &Value) -> Vec<Transaction> {
    normalize_payroll(snapshot, TransactionKind::StaffPayroll)
}

/// Normalizes placed worker records and their salary payments.
pub fn normalize_worker_payroll(snapshot: &Value) -> Vec<Transaction> {
    normalize_payroll(snapshot, TransactionKind::WorkerPayroll)
}

/// Every payment with a nonzero amount becomes one transaction, dated by the payment itself or,
/// failing that, by the employee record's creation date. An employee record without a payments
/// collection is read as a single payment.
fn normalize_payroll(snapshot: &Value, kind: TransactionKind) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for (key, employee) in fields::records(snapshot) {
        let created = fields::CREATED.date(employee);
        let payments = match nested(employee, fields::PAYMENTS) {
            Some(collection) => fields::records(collection),
            None => vec![(key, employee)],
        };
        for (_, payment) in payments {
            let amount = fields::PAYROLL_AMOUNT.amount(payment).abs();
            if amount.is_zero() {
                trace!("Skipping {kind} payment without an amount for {key:?}");
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_nested_payments() {
        let snapshot = json!({
            "s1": {
                "name": "Asha",
                "createdAt": "2024-01-05",
                "payments": {
                    "p1": {"amount": 12000, "date": "2024-02-01"},
                    "p2": {"amount": 0},
                    "p3": {"salary": "12,000"}
                }
            }
        });
        let transactions = normalize_staff_payroll(&snapshot);
        assert_eq!(transactions.len(), 2);
        assert!(transactions
            .iter()
            .all(|t| t.kind() == TransactionKind::StaffPayroll));
        assert_eq!(
            transactions[0].parsed_date(),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            transactions[1].parsed_date(),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_record_without_payments_is_one_payment() {
        let snapshot = json!([{"name": "Ravi", "paidAmount": 9000, "date": "Apr 2024"}]);
        let transactions = normalize_worker_payroll(&snapshot);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind(), TransactionKind::WorkerPayroll);
        assert_eq!(transactions[0].amount().value(), 9000.0);
        assert_eq!(
            transactions[0].parsed_date(),
            NaiveDate::from_ymd_opt(2024, 4, 1)
        );
    }

    #[test]
    fn test_empty_payments_collection() {
        let snapshot = json!([{"name": "Ravi", "salary": 9000, "payments": []}]);
        assert!(normalize_worker_payroll(&snapshot).is_empty());
    }

    #[test]
    fn test_absent_snapshot() {
        assert!(normalize_staff_payroll(&Value::Null).is_empty());
    }
}
