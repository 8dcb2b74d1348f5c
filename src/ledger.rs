//! The aggregation step: merges every normalized transaction into one list, sorts it newest first
//! and indexes it by year and month. A `Ledger` is rebuilt from scratch on every update.

use crate::model::{Amount, Transaction, TransactionKind};
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const UNKNOWN: &str = "Unknown";

/// The year bucket of a transaction. `Unknown` holds transactions without a parseable date.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum YearKey {
    Year(i32),
    Unknown,
}

impl YearKey {
    pub fn of(date: Option<NaiveDate>) -> Self {
        date.map(|d| YearKey::Year(d.year()))
            .unwrap_or(YearKey::Unknown)
    }
}

impl Display for YearKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            YearKey::Year(y) => write!(f, "{y}"),
            YearKey::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl FromStr for YearKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(UNKNOWN) {
            return Ok(YearKey::Unknown);
        }
        s.parse()
            .map(YearKey::Year)
            .with_context(|| format!("'{s}' is not a year"))
    }
}

impl Serialize for YearKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            YearKey::Year(y) => serializer.serialize_i32(*y),
            YearKey::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// The month bucket of a transaction, by zero-based month index.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MonthKey {
    Month(u32),
    Unknown,
}

impl MonthKey {
    pub fn of(date: Option<NaiveDate>) -> Self {
        date.map(|d| MonthKey::Month(d.month0()))
            .unwrap_or(MonthKey::Unknown)
    }

    /// A month from its zero-based index, `None` when out of range.
    pub fn from_index(index: u32) -> Option<Self> {
        (index < 12).then_some(MonthKey::Month(index))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MonthKey::Unknown)
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthKey::Month(ix) => {
                let name = u8::try_from(*ix + 1)
                    .ok()
                    .and_then(|m| chrono::Month::try_from(m).ok())
                    .map(|m| m.name())
                    .unwrap_or(UNKNOWN);
                f.write_str(name)
            }
            MonthKey::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MonthKey::Month(ix) => serializer.serialize_u32(*ix),
            MonthKey::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// All transactions of one year, both flat and grouped by month, newest first.
#[derive(Debug, Clone, Default)]
pub struct YearBucket {
    months: BTreeMap<MonthKey, Vec<Transaction>>,
    transactions: Vec<Transaction>,
}

impl YearBucket {
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn month(&self, month: MonthKey) -> &[Transaction] {
        self.months.get(&month).map(Vec::as_slice).unwrap_or_default()
    }

    /// Month keys in calendar order with `Unknown` last.
    pub fn month_keys(&self) -> Vec<MonthKey> {
        self.months.keys().copied().collect()
    }

    /// The most recent month that is not `Unknown`, falling back to `Unknown`.
    pub fn latest_month(&self) -> Option<MonthKey> {
        self.months
            .keys()
            .rev()
            .find(|m| !m.is_unknown())
            .or_else(|| self.months.keys().next())
            .copied()
    }
}

/// A named subset of transactions over which totals are computed.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Scope {
    Overall,
    Year(YearKey),
    Month(YearKey, MonthKey),
}

/// The merged, sorted transaction list and its year/month index.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    years: BTreeMap<YearKey, YearBucket>,
}

impl Ledger {
    /// Builds the ledger from every normalizer's output (discretionary entries already
    /// deduplicated):
    /// - transactions without a resolved date get one more parse attempt. Dates are already
    ///   parsed when each transaction is created and parsing is deterministic, so this only
    ///   confirms that they stay undated and are filed under `Unknown`
    /// - the list is sorted newest first, undated transactions last, ties in input order
    /// - each transaction is filed under its year and month
    pub fn build(mut transactions: Vec<Transaction>) -> Self {
        for transaction in transactions.iter_mut() {
            transaction.resolve_date();
        }
        transactions.sort_by(|a, b| b.parsed_date().cmp(&a.parsed_date()));

        let mut years: BTreeMap<YearKey, YearBucket> = BTreeMap::new();
        for transaction in &transactions {
            let date = transaction.parsed_date();
            let bucket = years.entry(YearKey::of(date)).or_default();
            bucket
                .months
                .entry(MonthKey::of(date))
                .or_default()
                .push(transaction.clone());
            bucket.transactions.push(transaction.clone());
        }

        Self {
            transactions,
            years,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The available years, newest first, with `Unknown` last.
    pub fn year_keys(&self) -> Vec<YearKey> {
        let mut keys: Vec<YearKey> = self.years.keys().copied().collect();
        keys.sort_by(|a, b| match (a, b) {
            (YearKey::Year(x), YearKey::Year(y)) => y.cmp(x),
            _ => a.cmp(b),
        });
        keys
    }

    pub fn year(&self, year: YearKey) -> Option<&YearBucket> {
        self.years.get(&year)
    }

    /// The transactions of one month, empty when the ledger has none.
    pub fn month(&self, year: YearKey, month: MonthKey) -> &[Transaction] {
        self.year(year).map(|b| b.month(month)).unwrap_or_default()
    }

    /// The transactions of a scope.
    pub fn scope(&self, scope: Scope) -> &[Transaction] {
        match scope {
            Scope::Overall => self.transactions(),
            Scope::Year(year) => self
                .year(year)
                .map(YearBucket::transactions)
                .unwrap_or_default(),
            Scope::Month(year, month) => self.month(year, month),
        }
    }

    pub fn totals(&self, scope: Scope) -> ScopeTotals {
        compute_totals(self.scope(scope))
    }
}

/// Running sums per kind, plus the derived expense and profit.
///
/// `expense` is investment + discretionary + staff payroll + worker payroll + commission. Facility
/// charges are totalled but are not part of `expense` or `profit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ScopeTotals {
    pub income: Amount,
    pub investment: Amount,
    pub discretionary: Amount,
    pub staff_payroll: Amount,
    pub worker_payroll: Amount,
    pub commission: Amount,
    pub facility_charge: Amount,
    pub expense: Amount,
    pub profit: Amount,
}

impl ScopeTotals {
    /// The running sum for one kind.
    pub fn get(&self, kind: TransactionKind) -> Amount {
        match kind {
            TransactionKind::Client => self.income,
            TransactionKind::Investment => self.investment,
            TransactionKind::Discretionary => self.discretionary,
            TransactionKind::StaffPayroll => self.staff_payroll,
            TransactionKind::WorkerPayroll => self.worker_payroll,
            TransactionKind::Commission => self.commission,
            TransactionKind::FacilityCharge => self.facility_charge,
        }
    }

    fn slot(&mut self, kind: TransactionKind) -> &mut Amount {
        match kind {
            TransactionKind::Client => &mut self.income,
            TransactionKind::Investment => &mut self.investment,
            TransactionKind::Discretionary => &mut self.discretionary,
            TransactionKind::StaffPayroll => &mut self.staff_payroll,
            TransactionKind::WorkerPayroll => &mut self.worker_payroll,
            TransactionKind::Commission => &mut self.commission,
            TransactionKind::FacilityCharge => &mut self.facility_charge,
        }
    }
}

/// Sums a transaction list in one pass.
pub fn compute_totals(transactions: &[Transaction]) -> ScopeTotals {
    let mut totals = ScopeTotals::default();
    for transaction in transactions {
        *totals.slot(transaction.kind()) += transaction.amount();
    }
    totals.expense = totals.investment
        + totals.discretionary
        + totals.staff_payroll
        + totals.worker_payroll
        + totals.commission;
    totals.profit = totals.income - totals.expense;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawDate;
    use serde_json::json;
    use std::sync::Arc;

    fn txn(kind: TransactionKind, date: &str, amount: f64) -> Transaction {
        let raw = if date.is_empty() {
            RawDate::Missing
        } else {
            RawDate::Text(date.to_string())
        };
        Transaction::new(kind, raw, Amount::new(amount), Arc::new(json!({})))
    }

    #[test]
    fn test_sorted_newest_first_unknown_last() {
        let ledger = Ledger::build(vec![
            txn(TransactionKind::Client, "", 1.0),
            txn(TransactionKind::Client, "2023-05-01", 2.0),
            txn(TransactionKind::Client, "2024-01-01", 3.0),
            txn(TransactionKind::Client, "not a date", 4.0),
        ]);
        let amounts: Vec<f64> = ledger
            .transactions()
            .iter()
            .map(|t| t.amount().value())
            .collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0, 4.0]);
    }

    #[test]
    fn test_unparseable_dates_stay_unknown() {
        let garbage = txn(TransactionKind::Investment, "garbage", 7.0);
        assert_eq!(garbage.parsed_date(), None);
        let ledger = Ledger::build(vec![garbage, txn(TransactionKind::Investment, "", 3.0)]);
        assert!(ledger.transactions().iter().all(|t| t.parsed_date().is_none()));
        assert_eq!(ledger.year_keys(), vec![YearKey::Unknown]);
        let unknown = ledger.totals(Scope::Month(YearKey::Unknown, MonthKey::Unknown));
        assert_eq!(unknown.investment.value(), 10.0);
    }

    #[test]
    fn test_year_keys() {
        let ledger = Ledger::build(vec![
            txn(TransactionKind::Client, "2022-05-01", 1.0),
            txn(TransactionKind::Client, "", 1.0),
            txn(TransactionKind::Client, "2024-01-01", 1.0),
            txn(TransactionKind::Client, "2023-01-01", 1.0),
        ]);
        assert_eq!(
            ledger.year_keys(),
            vec![
                YearKey::Year(2024),
                YearKey::Year(2023),
                YearKey::Year(2022),
                YearKey::Unknown
            ]
        );
    }

    #[test]
    fn test_year_and_month_index() {
        let ledger = Ledger::build(vec![
            txn(TransactionKind::Client, "2024-03-01", 1.0),
            txn(TransactionKind::Investment, "2024-03-20", 2.0),
            txn(TransactionKind::Investment, "2024-01-20", 3.0),
            txn(TransactionKind::Investment, "", 4.0),
        ]);
        let year = ledger.year(YearKey::Year(2024)).unwrap();
        assert_eq!(year.transactions().len(), 3);
        assert_eq!(year.month(MonthKey::Month(2)).len(), 2);
        assert_eq!(
            year.month_keys(),
            vec![MonthKey::Month(0), MonthKey::Month(2)]
        );
        assert_eq!(year.latest_month(), Some(MonthKey::Month(2)));
        assert_eq!(
            ledger.month(YearKey::Unknown, MonthKey::Unknown).len(),
            1
        );
        assert!(ledger.month(YearKey::Year(1999), MonthKey::Month(0)).is_empty());
    }

    #[test]
    fn test_latest_month_falls_back_to_unknown() {
        let ledger = Ledger::build(vec![txn(TransactionKind::Client, "", 1.0)]);
        let bucket = ledger.year(YearKey::Unknown).unwrap();
        assert_eq!(bucket.latest_month(), Some(MonthKey::Unknown));
    }

    #[test]
    fn test_compute_totals() {
        let totals = compute_totals(&[
            txn(TransactionKind::Client, "", 1000.0),
            txn(TransactionKind::Client, "", -100.0),
            txn(TransactionKind::Investment, "", 50.0),
            txn(TransactionKind::Discretionary, "", 25.0),
            txn(TransactionKind::StaffPayroll, "", 200.0),
            txn(TransactionKind::WorkerPayroll, "", 300.0),
            txn(TransactionKind::Commission, "", 10.0),
            txn(TransactionKind::FacilityCharge, "", 99.0),
        ]);
        assert_eq!(totals.income.value(), 900.0);
        assert_eq!(totals.expense.value(), 585.0);
        assert_eq!(totals.profit.value(), 315.0);
        assert_eq!(totals.facility_charge.value(), 99.0);
        assert_eq!(totals.get(TransactionKind::WorkerPayroll).value(), 300.0);
    }

    #[test]
    fn test_facility_charge_never_reaches_profit() {
        let without = compute_totals(&[txn(TransactionKind::Client, "", 10.0)]);
        let with = compute_totals(&[
            txn(TransactionKind::Client, "", 10.0),
            txn(TransactionKind::FacilityCharge, "", 7.0),
        ]);
        assert_eq!(without.expense, with.expense);
        assert_eq!(without.profit, with.profit);
        assert_eq!(with.facility_charge.value(), 7.0);
    }

    #[test]
    fn test_empty_totals_are_zero() {
        let totals = Ledger::default().totals(Scope::Overall);
        assert_eq!(totals, ScopeTotals::default());
        assert!(totals.profit.is_zero());
    }

    #[test]
    fn test_key_display_and_parse() {
        assert_eq!(MonthKey::Month(2).to_string(), "March");
        assert_eq!(MonthKey::Unknown.to_string(), "Unknown");
        assert_eq!(MonthKey::from_index(12), None);
        assert_eq!(YearKey::Year(2024).to_string(), "2024");
        assert_eq!(YearKey::from_str("unknown").unwrap(), YearKey::Unknown);
        assert_eq!(YearKey::from_str("2024").unwrap(), YearKey::Year(2024));
        assert!(YearKey::from_str("twenty").is_err());
    }
}
