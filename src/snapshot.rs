//! The eleven logical collections the dashboard depends on, the latest value received from each,
//! and the full normalize → deduplicate → aggregate pass over them.

use crate::dedup::dedup_discretionary;
use crate::ledger::Ledger;
use crate::model::Transaction;
use crate::normalize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

static NULL: Value = Value::Null;

/// A logical source collection. These are names, not storage paths.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKey {
    Clients,
    ClientsArchived,
    Investments,
    /// The root of the petty cash tree.
    PettyCash,
    /// The entries sub-path of the petty cash tree.
    PettyCashEntries,
    /// The same sub-path under its capitalized legacy name.
    PettyCashEntriesCased,
    Staff,
    StaffFormer,
    Workers,
    WorkersFormer,
    Facilities,
}

serde_plain::derive_display_from_serialize!(SourceKey);
serde_plain::derive_fromstr_from_deserialize!(SourceKey);

/// The record family stored in a collection, which decides the normalizer it goes through.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Family {
    Clients,
    Investments,
    Discretionary,
    StaffPayroll,
    WorkerPayroll,
    Facilities,
}

impl SourceKey {
    pub const ALL: [SourceKey; 11] = [
        SourceKey::Clients,
        SourceKey::ClientsArchived,
        SourceKey::Investments,
        SourceKey::PettyCash,
        SourceKey::PettyCashEntries,
        SourceKey::PettyCashEntriesCased,
        SourceKey::Staff,
        SourceKey::StaffFormer,
        SourceKey::Workers,
        SourceKey::WorkersFormer,
        SourceKey::Facilities,
    ];

    pub fn family(&self) -> Family {
        match self {
            SourceKey::Clients | SourceKey::ClientsArchived => Family::Clients,
            SourceKey::Investments => Family::Investments,
            SourceKey::PettyCash
            | SourceKey::PettyCashEntries
            | SourceKey::PettyCashEntriesCased => Family::Discretionary,
            SourceKey::Staff | SourceKey::StaffFormer => Family::StaffPayroll,
            SourceKey::Workers | SourceKey::WorkersFormer => Family::WorkerPayroll,
            SourceKey::Facilities => Family::Facilities,
        }
    }

    /// The default snapshot file name, e.g. `clients-archived.json`.
    pub fn file_name(&self) -> String {
        format!("{self}.json")
    }
}

/// The latest full value pushed by each source. A source that has never pushed reads as `null`,
/// which every normalizer treats as an empty collection.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    slots: BTreeMap<SourceKey, Arc<Value>>,
}

impl Snapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value of one slot.
    pub fn apply(&mut self, key: SourceKey, value: Value) {
        trace!("Snapshot {key} replaced");
        self.slots.insert(key, Arc::new(value));
    }

    pub fn get(&self, key: SourceKey) -> &Value {
        self.slots.get(&key).map(|v| v.as_ref()).unwrap_or(&NULL)
    }

    pub fn has_reported(&self, key: SourceKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// The number of sources that have pushed at least once.
    pub fn reported(&self) -> usize {
        self.slots.len()
    }

    /// Runs every normalizer over the current slots. Discretionary entries from all petty cash
    /// paths are deduplicated together.
    pub fn normalize(&self) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        let mut discretionary = Vec::new();
        for key in SourceKey::ALL {
            let value = self.get(key);
            match key.family() {
                Family::Clients => transactions.extend(normalize::normalize_clients(value)),
                Family::Investments => {
                    transactions.extend(normalize::normalize_investments(value))
                }
                Family::Discretionary => {
                    discretionary.extend(normalize::normalize_discretionary(value))
                }
                Family::StaffPayroll => {
                    transactions.extend(normalize::normalize_staff_payroll(value))
                }
                Family::WorkerPayroll => {
                    transactions.extend(normalize::normalize_worker_payroll(value))
                }
                Family::Facilities => {
                    transactions.extend(normalize::normalize_commissions(value));
                    transactions.extend(normalize::normalize_facility_charges(value));
                }
            }
        }
        transactions.extend(dedup_discretionary(discretionary));
        transactions
    }

    /// The full pipeline: normalize, deduplicate and aggregate.
    pub fn ledger(&self) -> Ledger {
        Ledger::build(self.normalize())
    }
}
