//! Discretionary (petty cash) expenses are stored as an arbitrarily deep tree: categories holding
//! sub-categories holding line items, where some container nodes also carry a rolled-up amount.
//! The tree is decoded into `Node`s bottom-up so that only the deepest amount-bearing nodes count.

use crate::model::fields::{self, AMOUNT, CATEGORY};
use crate::model::{Amount, RawDate, Transaction, TransactionKind};
use serde_json::Value;
use std::sync::Arc;

const UNCATEGORIZED: &str = "Uncategorized";

/// A decoded node of the discretionary-expense tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A node with a nonzero amount and no amount-bearing descendants.
    Leaf(Entry),
    /// Everything else: plain containers, and rollup nodes whose amount is superseded by the line
    /// items below them.
    Branch(Vec<Node>),
}

/// The contents of a `Leaf`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub amount: Amount,
    pub category: Option<String>,
    pub date: RawDate,
    pub record: Arc<Value>,
}

impl Node {
    /// Decodes a raw tree. Every object-valued and array-valued field is descended into, whether or
    /// not its parent carries an amount.
    pub fn decode(value: &Value) -> Node {
        decode(value, None)
    }

    /// True if this node or any node below it is a `Leaf`.
    pub fn has_leaf(&self) -> bool {
        match self {
            Node::Leaf(_) => true,
            Node::Branch(children) => children.iter().any(Node::has_leaf),
        }
    }

    /// Collects the leaves in depth-first order.
    pub fn leaves(&self) -> Vec<&Entry> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Entry>) {
        match self {
            Node::Leaf(entry) => out.push(entry),
            Node::Branch(children) => children.iter().for_each(|c| c.collect(out)),
        }
    }
}

/// `inherited` is the category label of the nearest labelled ancestor. Only explicit category
/// fields label a node; mapping keys never do, since the same tree is reachable from more than one
/// snapshot path with different keys above it.
fn decode(value: &Value, inherited: Option<&str>) -> Node {
    match value {
        Value::Array(items) => Node::Branch(
            items
                .iter()
                .map(|item| decode(item, inherited))
                .collect(),
        ),
        Value::Object(map) => {
            let label = CATEGORY.text(value).or_else(|| inherited.map(str::to_string));
            let children: Vec<Node> = map
                .values()
                .filter(|child| child.is_object() || child.is_array())
                .map(|child| decode(child, label.as_deref()))
                .collect();

            let amount = AMOUNT.amount(value);
            if !amount.is_zero() && !children.iter().any(Node::has_leaf) {
                Node::Leaf(Entry {
                    amount,
                    category: label,
                    date: fields::DATE.date(value),
                    record: Arc::new(value.clone()),
                })
            } else {
                Node::Branch(children)
            }
        }
        _ => Node::Branch(Vec::new()),
    }
}

/// Normalizes a discretionary-expense tree into one transaction per leaf.
pub fn normalize_discretionary(snapshot: &Value) -> Vec<Transaction> {
    Node::decode(snapshot)
        .leaves()
        .into_iter()
        .map(|entry| {
            Transaction::new(
                TransactionKind::Discretionary,
                entry.date.clone(),
                entry.amount.abs(),
                entry.record.clone(),
            )
            .with_category(entry.category.as_deref().unwrap_or(UNCATEGORIZED))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parent_rollup_is_suppressed() {
        let snapshot = json!({"amount": 100, "items": [{"amount": 40}]});
        let transactions = normalize_discretionary(&snapshot);
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount().value(), 40.0);
    }

    #[test]
    fn test_deep_leaves_under_plain_containers() {
        let snapshot = json!({
            "Travel": {
                "march": {
                    "e1": {"amount": "250", "date": "2024-03-02"},
                    "e2": {"amount": 0, "date": "2024-03-03"}
                }
            },
            "Office": [[{"amount": 12.5}]]
        });
        let transactions = normalize_discretionary(&snapshot);
        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount().value()).collect();
        assert_eq!(amounts, vec![12.5, 250.0]);
    }

    #[test]
    fn test_rollup_with_deeper_grandchild() {
        let snapshot = json!({
            "total": 90,
            "sub": {"total": 90, "lines": {"a": {"amount": 60}, "b": {"amount": 30}}}
        });
        let node = Node::decode(&snapshot);
        let leaves = node.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(
            leaves.iter().map(|e| e.amount.value()).sum::<f64>(),
            90.0
        );
    }

    #[test]
    fn test_category_labels() {
        let snapshot = json!({
            "Travel": {"e1": {"amount": 10}},
            "misc": {"category": "Food", "items": [{"amount": 5}, {"amount": 7, "category": "Tea"}]},
            "x": [{"amount": 1, "head": "Stationery"}]
        });
        let transactions = normalize_discretionary(&snapshot);
        let categories: Vec<&str> = transactions.iter().filter_map(|t| t.category()).collect();
        assert_eq!(categories, vec![UNCATEGORIZED, "Food", "Tea", "Stationery"]);

        let loose = json!([{"amount": 3}]);
        assert_eq!(
            normalize_discretionary(&loose)[0].category(),
            Some(UNCATEGORIZED)
        );
    }

    #[test]
    fn test_category_does_not_depend_on_the_path() {
        let entries = json!({"e1": {"amount": 500, "date": "2024-03-05"}});
        let from_root = normalize_discretionary(&json!({"entries": entries.clone()}));
        let from_entries = normalize_discretionary(&entries);
        assert_eq!(from_root.len(), 1);
        assert_eq!(from_root[0].category(), from_entries[0].category());
        assert_eq!(from_root[0].category(), Some(UNCATEGORIZED));
    }

    #[test]
    fn test_amounts_are_positive_magnitudes() {
        let snapshot = json!([{"amount": -45}]);
        assert_eq!(normalize_discretionary(&snapshot)[0].amount().value(), 45.0);
    }

    #[test]
    fn test_empty_and_scalar_trees() {
        assert!(normalize_discretionary(&Value::Null).is_empty());
        assert!(normalize_discretionary(&json!(42)).is_empty());
        assert!(!Node::decode(&json!({"a": {"b": {}}})).has_leaf());
    }
}
