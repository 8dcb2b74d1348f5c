//! Removes discretionary expenses that were normalized more than once because the same tree is
//! reachable from several snapshot paths.
//!
//! The signature of an entry is its explicit identifier when the source record has one. Otherwise
//! it is the amount, the lowercased category and the year-month of the entry. The second form can
//! collapse two genuinely distinct expenses of the same amount, category and month; totals have
//! always been reported that way.

use crate::model::fields;
use crate::model::Transaction;
use chrono::Datelike;
use std::collections::HashSet;
use tracing::debug;

/// The deduplication key of a discretionary transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Id(String),
    /// Amount (as raw `f64` bits), lowercased category and `YYYY-MM` or `Unknown`.
    Content(u64, String, String),
}

impl Signature {
    pub fn of(transaction: &Transaction) -> Self {
        if let Some(id) = fields::IDENTIFIER.text(transaction.source()) {
            return Signature::Id(id);
        }
        let amount = transaction.amount().value();
        // -0.0 and 0.0 must collide
        let bits = if amount == 0.0 { 0 } else { amount.to_bits() };
        let category = transaction.category().unwrap_or_default().to_lowercase();
        let month = match transaction.parsed_date() {
            Some(date) => format!("{:04}-{:02}", date.year(), date.month()),
            None => String::from("Unknown"),
        };
        Signature::Content(bits, category, month)
    }
}

/// Keeps the first transaction seen for each signature, preserving input order.
pub fn dedup_discretionary(transactions: Vec<Transaction>) -> Vec<Transaction> {
    let before = transactions.len();
    let mut seen = HashSet::new();
    let kept: Vec<Transaction> = transactions
        .into_iter()
        .filter(|t| seen.insert(Signature::of(t)))
        .collect();
    if kept.len() < before {
        debug!(
            "Dropped {} duplicate discretionary entries",
            before - kept.len()
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_discretionary;
    use serde_json::json;

    #[test]
    fn test_same_content_without_id_collapses() {
        let tree = json!([
            {"amount": 500, "category": "Travel", "date": "2024-03-02"},
            {"amount": 500, "category": "travel", "date": "2024-03-20"}
        ]);
        let kept = dedup_discretionary(normalize_discretionary(&tree));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].raw_date().to_string(), "2024-03-02");
    }

    #[test]
    fn test_distinct_ids_remain_distinct() {
        let tree = json!([
            {"id": "a", "amount": 500, "category": "Travel", "date": "2024-03-02"},
            {"id": "b", "amount": 500, "category": "Travel", "date": "2024-03-02"}
        ]);
        assert_eq!(dedup_discretionary(normalize_discretionary(&tree)).len(), 2);
    }

    #[test]
    fn test_same_id_across_paths_collapses() {
        let tree = json!({"id": "x1", "amount": 20, "date": "2024-01-01"});
        let mut both = normalize_discretionary(&tree);
        both.extend(normalize_discretionary(&tree));
        assert_eq!(both.len(), 2);
        assert_eq!(dedup_discretionary(both).len(), 1);
    }

    #[test]
    fn test_different_month_or_amount_is_kept() {
        let tree = json!([
            {"amount": 500, "category": "Travel", "date": "2024-03-02"},
            {"amount": 500, "category": "Travel", "date": "2024-04-02"},
            {"amount": 501, "category": "Travel", "date": "2024-03-02"}
        ]);
        assert_eq!(dedup_discretionary(normalize_discretionary(&tree)).len(), 3);
    }

    #[test]
    fn test_unknown_dates_share_a_month() {
        let tree = json!([
            {"amount": 5, "category": "Tea"},
            {"amount": 5, "category": "Tea", "date": "garbage"}
        ]);
        assert_eq!(dedup_discretionary(normalize_discretionary(&tree)).len(), 1);
    }
}
