use crate::model::{fields, Amount, RawDate};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// The family of records a `Transaction` was normalized from.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Client,
    Investment,
    Discretionary,
    StaffPayroll,
    WorkerPayroll,
    Commission,
    FacilityCharge,
}

serde_plain::derive_display_from_serialize!(TransactionKind);
serde_plain::derive_fromstr_from_deserialize!(TransactionKind);

impl TransactionKind {
    pub const ALL: [TransactionKind; 7] = [
        TransactionKind::Client,
        TransactionKind::Investment,
        TransactionKind::Discretionary,
        TransactionKind::StaffPayroll,
        TransactionKind::WorkerPayroll,
        TransactionKind::Commission,
        TransactionKind::FacilityCharge,
    ];

    /// Client payments are the only income; every other kind is an expense.
    pub fn is_income(&self) -> bool {
        matches!(self, TransactionKind::Client)
    }
}

/// One canonical financial event.
///
/// For `Client` the amount is net income (payment minus refund, so possibly negative). For every
/// other kind it is a positive expense magnitude.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    kind: TransactionKind,
    raw_date: RawDate,
    parsed_date: Option<NaiveDate>,
    amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    /// The record this was normalized from. Read for display fields only, never mutated.
    #[serde(skip)]
    source: Arc<Value>,
}

impl Transaction {
    /// Creates a transaction and resolves its date once.
    pub fn new(kind: TransactionKind, raw_date: RawDate, amount: Amount, source: Arc<Value>) -> Self {
        let parsed_date = raw_date.parse();
        Self {
            kind,
            raw_date,
            parsed_date,
            amount,
            category: None,
            source,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn raw_date(&self) -> &RawDate {
        &self.raw_date
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        self.parsed_date
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn source(&self) -> &Value {
        &self.source
    }

    /// The free-text note of the source record, if any.
    pub fn note(&self) -> Option<String> {
        fields::NOTE.text(&self.source)
    }

    /// Retries date parsing when no date has been resolved yet. A resolved date is never
    /// recomputed.
    pub(crate) fn resolve_date(&mut self) -> Option<NaiveDate> {
        if self.parsed_date.is_none() {
            self.parsed_date = self.raw_date.parse();
        }
        self.parsed_date
    }
}
