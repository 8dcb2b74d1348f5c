//! Source normalizers. Each one takes the raw snapshot of one record family (a list, a keyed
//! mapping, or nothing at all) and flattens it into `Transaction`s. Normalizers never fail: absent
//! or malformed fields become zero amounts and missing dates.

mod client;
mod discretionary;
mod facility;
mod investment;
mod payroll;

pub use client::normalize_clients;
pub use discretionary::{normalize_discretionary, Entry, Node};
pub use facility::{normalize_commissions, normalize_facility_charges};
pub use investment::normalize_investments;
pub use payroll::{normalize_staff_payroll, normalize_worker_payroll};

use crate::model::fields::Aliases;
use crate::model::RawDate;
use serde_json::Value;

/// Returns the first alias of `record` that holds a collection (a list or a mapping).
fn nested(record: &Value, aliases: Aliases) -> Option<&Value> {
    aliases
        .find(record)
        .filter(|v| v.is_array() || v.is_object())
}

/// Uses `date` unless it is missing, in which case `fallback` is used.
fn date_or(date: RawDate, fallback: &RawDate) -> RawDate {
    if date.is_missing() {
        fallback.clone()
    } else {
        date
    }
}
