//! Field aliases for untyped source records.
//!
//! The same concept has been stored under different keys as the screens that write these records
//! changed over time. Each concept is an `Aliases` list, tried in order; the first key holding a
//! present value wins. A value is present when it is neither `null` nor an empty string.

use crate::model::{Amount, RawDate};
use serde_json::Value;

/// An ordered list of keys under which one concept may be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aliases(&'static [&'static str]);

pub const AMOUNT: Aliases = Aliases(&[
    "amount",
    "paidAmount",
    "paid_amount",
    "value",
    "total",
    "price",
    "cost",
]);
pub const PAID_AMOUNT: Aliases = Aliases(&[
    "paidAmount",
    "paid_amount",
    "amountPaid",
    "amount",
    "payment",
]);
pub const REFUND_AMOUNT: Aliases = Aliases(&[
    "refundAmount",
    "refund_amount",
    "refundedAmount",
    "refund",
]);
pub const REFUND_FLAG: Aliases = Aliases(&["isRefund", "is_refund", "refunded"]);
pub const BALANCE_FLAG: Aliases = Aliases(&["isBalanceAdjustment", "balanceAdjustment", "is_balance"]);
pub const ENTRY_TYPE: Aliases = Aliases(&["type", "paymentType", "payment_type"]);
pub const DATE: Aliases = Aliases(&[
    "date",
    "paymentDate",
    "payment_date",
    "paidOn",
    "paidDate",
    "expenseDate",
    "createdAt",
    "created_at",
    "timestamp",
]);
pub const CREATED: Aliases = Aliases(&["createdAt", "created_at", "joinedAt", "joiningDate", "date"]);
pub const PAYROLL_AMOUNT: Aliases = Aliases(&[
    "amount",
    "paidAmount",
    "paid_amount",
    "salary",
    "netPay",
    "net_pay",
]);
pub const PAYMENTS: Aliases = Aliases(&[
    "payments",
    "paymentHistory",
    "payment_history",
    "salaryPayments",
    "salary_payments",
]);
pub const PAYMENT_LOGS: Aliases = Aliases(&["paymentLogs", "payment_logs", "logs"]);
pub const COMMISSION: Aliases = Aliases(&[
    "commission",
    "agentCommission",
    "agent_commission",
    "commissionAmount",
]);
pub const SERVICE_CHARGE: Aliases = Aliases(&[
    "serviceCharge",
    "service_charge",
    "facilityCharge",
    "facility_charge",
    "charges",
]);
pub const CATEGORY: Aliases = Aliases(&["category", "categoryName", "type", "head"]);
pub const IDENTIFIER: Aliases = Aliases(&["id", "_id", "entryId", "expenseId", "key"]);
pub const NOTE: Aliases = Aliases(&[
    "note",
    "notes",
    "remarks",
    "remark",
    "description",
    "comment",
    "purpose",
]);

impl Aliases {
    pub const fn keys(&self) -> &'static [&'static str] {
        self.0
    }

    /// Returns the first present value, if any.
    pub fn find<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let map = record.as_object()?;
        self.0
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|v| is_present(v))
    }

    /// Returns the key that `find` would read from.
    pub fn find_key(&self, record: &Value) -> Option<&'static str> {
        let map = record.as_object()?;
        self.0
            .iter()
            .find(|key| map.get(**key).is_some_and(is_present))
            .copied()
    }

    /// Coerces the first present value into an `Amount`, zero if there is none.
    pub fn amount(&self, record: &Value) -> Amount {
        self.find(record).map(Amount::coerce).unwrap_or_default()
    }

    pub fn date(&self, record: &Value) -> RawDate {
        self.find(record).map(RawDate::from_value).unwrap_or_default()
    }

    /// Returns the first present value as text. Numbers are rendered; other shapes are skipped.
    pub fn text(&self, record: &Value) -> Option<String> {
        let map = record.as_object()?;
        self.0.iter().filter_map(|key| map.get(*key)).find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// True when the first present value is set: `true`, `"true"`, `"yes"` or a nonzero number.
    pub fn flag(&self, record: &Value) -> bool {
        self.find(record).is_some_and(is_set)
    }

    /// True when the first present value is text equal to one of `labels`, ignoring case.
    pub fn is_one_of(&self, record: &Value, labels: &[&str]) -> bool {
        self.find(record)
            .and_then(Value::as_str)
            .map(|s| s.trim())
            .is_some_and(|s| labels.iter().any(|l| l.eq_ignore_ascii_case(s)))
    }
}

pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes")
        }
        _ => false,
    }
}

/// Flattens a collection into its object-valued records. A list is read in order, a mapping in key
/// order with each record paired with its key. Anything else is an empty collection.
pub fn records(collection: &Value) -> Vec<(Option<&str>, &Value)> {
    match collection {
        Value::Array(items) => items
            .iter()
            .filter(|v| v.is_object())
            .map(|v| (None, v))
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| v.is_object())
            .map(|(k, v)| (Some(k.as_str()), v))
            .collect(),
        _ => Vec::new(),
    }
}
