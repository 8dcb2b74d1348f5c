//! The dashboard's year/month selection and the Overall, Year and Month totals derived from it.

use crate::ledger::{compute_totals, Ledger, MonthKey, Scope, ScopeTotals, YearKey};
use serde::Serialize;
use tracing::{debug, warn};

/// What the dashboard is currently showing.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Selection {
    /// No source has reported any transaction.
    #[default]
    NoData,
    /// Data is loaded but no year is selected.
    Loaded,
    Year(YearKey),
    Month(YearKey, MonthKey),
}

/// Holds the latest `Ledger` and the selection made over it.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    ledger: Ledger,
    selection: Selection,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ledger after a recompute. The first non-empty ledger selects the most recent
    /// year and, within it, the most recent dated month. Later ledgers keep the selection. An empty
    /// ledger returns the dashboard to `NoData`.
    pub fn refresh(&mut self, ledger: Ledger) {
        self.ledger = ledger;
        if self.ledger.is_empty() {
            self.selection = Selection::NoData;
            return;
        }
        if self.selection == Selection::NoData {
            self.selection = Selection::Loaded;
            self.auto_select();
        }
    }

    fn auto_select(&mut self) {
        let Some(year) = self.ledger.year_keys().first().copied() else {
            return;
        };
        let month = self.ledger.year(year).and_then(|b| b.latest_month());
        self.selection = match month {
            Some(month) => Selection::Month(year, month),
            None => Selection::Year(year),
        };
        debug!("Auto-selected {:?}", self.selection);
    }

    /// Selects a year. Choosing a different year resets the month to the first month index;
    /// choosing the current year again changes nothing.
    pub fn select_year(&mut self, year: YearKey) {
        if self.selection == Selection::NoData {
            warn!("Cannot select year {year} before any data is loaded");
            return;
        }
        if self.selected_year() == Some(year) {
            return;
        }
        self.selection = Selection::Month(year, MonthKey::Month(0));
    }

    /// Selects a month within the selected year.
    pub fn select_month(&mut self, month: MonthKey) {
        match self.selected_year() {
            Some(year) => self.selection = Selection::Month(year, month),
            None => warn!("Cannot select {month} without a selected year"),
        }
    }

    pub fn clear_month(&mut self) {
        if let Selection::Month(year, _) = self.selection {
            self.selection = Selection::Year(year);
        }
    }

    pub fn clear_year(&mut self) {
        if self.selection != Selection::NoData {
            self.selection = Selection::Loaded;
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn selected_year(&self) -> Option<YearKey> {
        match self.selection {
            Selection::Year(year) | Selection::Month(year, _) => Some(year),
            _ => None,
        }
    }

    pub fn selected_month(&self) -> Option<MonthKey> {
        match self.selection {
            Selection::Month(_, month) => Some(month),
            _ => None,
        }
    }

    pub fn overall_totals(&self) -> ScopeTotals {
        self.ledger.totals(Scope::Overall)
    }

    /// Totals of the selected year, zero when none is selected.
    pub fn year_totals(&self) -> ScopeTotals {
        match self.selected_year() {
            Some(year) => self.ledger.totals(Scope::Year(year)),
            None => compute_totals(&[]),
        }
    }

    /// Totals of the selected month, zero when none is selected.
    pub fn month_totals(&self) -> ScopeTotals {
        match self.selection {
            Selection::Month(year, month) => self.ledger.totals(Scope::Month(year, month)),
            _ => compute_totals(&[]),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            years: self.ledger.year_keys(),
            year: self.selected_year(),
            month: self.selected_month(),
            transactions: self.ledger.transactions().len(),
            overall: self.overall_totals(),
            year_totals: self.year_totals(),
            month_totals: self.month_totals(),
        }
    }
}

/// A serializable view of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub years: Vec<YearKey>,
    pub year: Option<YearKey>,
    pub month: Option<MonthKey>,
    pub transactions: usize,
    pub overall: ScopeTotals,
    pub year_totals: ScopeTotals,
    pub month_totals: ScopeTotals,
}
