//! staffdesk: the financial engine of a staffing agency dashboard.
//!
//! Raw collections (clients, investments, petty cash, staff, workers and facilities) arrive as
//! untyped JSON snapshots. They are normalized into `Transaction`s, deduplicated, indexed by year
//! and month, and summed into income, expense and profit totals.

pub mod args;
pub mod commands;
mod config;
pub mod dashboard;
pub mod dedup;
mod error;
pub mod export;
pub mod ledger;
pub mod model;
pub mod multiplexer;
pub mod normalize;
pub mod snapshot;
pub mod source;
mod utils;


pub use config::Config;
pub use error::{Error, Result};
