//! Flexible date handling for records whose dates were written by many different screens over the
//! years: ISO strings, epoch seconds or milliseconds, day-first numeric dates, `"Mar 2024"` style
//! month labels and native document-store timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

static DAY_FIRST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").unwrap());

static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{3})[A-Za-z]*\.?,?\s*(\d{4})$").unwrap());

/// The date value of a record exactly as it was received.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawDate {
    #[default]
    Missing,
    Text(String),
    Number(f64),
    /// A native timestamp, stored by the document store as `{ "seconds": .., "nanoseconds": .. }`.
    Timestamp(NaiveDateTime),
}

impl RawDate {
    /// Decodes a field value. Unrecognized shapes (arrays, booleans, arbitrary objects) are
    /// `Missing`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if !s.trim().is_empty() => RawDate::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(RawDate::Number).unwrap_or_default(),
            Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .and_then(Value::as_i64);
                let nanos = map
                    .get("nanoseconds")
                    .or_else(|| map.get("_nanoseconds"))
                    .and_then(Value::as_u64)
                    .unwrap_or_default();
                seconds
                    .and_then(|s| DateTime::from_timestamp(s, nanos.min(999_999_999) as u32))
                    .map(|dt| RawDate::Timestamp(dt.naive_utc()))
                    .unwrap_or_default()
            }
            _ => RawDate::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawDate::Missing)
    }

    /// Shorthand for `parse_flexible_date(self)`.
    pub fn parse(&self) -> Option<NaiveDate> {
        parse_flexible_date(self)
    }
}

impl Display for RawDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RawDate::Missing => Ok(()),
            RawDate::Text(s) => f.write_str(s),
            RawDate::Number(n) => f.write_str(&number_text(*n)),
            RawDate::Timestamp(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for RawDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RawDate::Missing => serializer.serialize_none(),
            RawDate::Number(n) => serializer.serialize_f64(*n),
            _ => serializer.collect_str(self),
        }
    }
}

/// Resolves a raw date to a calendar date, or `None` when every strategy fails. In order:
/// 1. a native timestamp is used as is
/// 2. a direct calendar parse of the trimmed text (ISO 8601 and a few written-out forms)
/// 3. 10 to 13 digits as an epoch timestamp: below 10^12 it is seconds, otherwise milliseconds
/// 4. `D/M/YYYY` or `D-M-YYYY`
/// 5. `Mon YYYY` or `Mon, YYYY`, which resolves to the first of that month
pub fn parse_flexible_date(raw: &RawDate) -> Option<NaiveDate> {
    match raw {
        RawDate::Missing => None,
        RawDate::Timestamp(dt) => Some(dt.date()),
        RawDate::Number(n) => parse_text(&number_text(*n)),
        RawDate::Text(s) => parse_text(s),
    }
}

fn parse_text(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_calendar(trimmed)
        .or_else(|| parse_epoch(trimmed))
        .or_else(|| parse_day_first(trimmed))
        .or_else(|| parse_month_year(trimmed))
}

fn parse_calendar(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

fn parse_epoch(s: &str) -> Option<NaiveDate> {
    if !(10..=13).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = s.parse().ok()?;
    let millis = if n < 1_000_000_000_000 { n * 1000 } else { n };
    DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
}

fn parse_day_first(s: &str) -> Option<NaiveDate> {
    let caps = DAY_FIRST.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_month_year(s: &str) -> Option<NaiveDate> {
    let caps = MONTH_YEAR.captures(s)?;
    let abbreviation = caps[1].to_ascii_lowercase();
    let index = MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == abbreviation)?;
    let year: i32 = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, index as u32 + 1, 1)
}

/// Integral numbers are written without a fractional part so that they can be read as epochs.
fn number_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
