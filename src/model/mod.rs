//! Types that represent the canonical data model: `Transaction`, `Amount` and `RawDate`, plus the
//! field aliases used to read them out of untyped source records.
mod amount;
mod date;
pub mod fields;
mod transaction;

pub use amount::Amount;
pub use date::{parse_flexible_date, RawDate};
pub use transaction::{Transaction, TransactionKind};
