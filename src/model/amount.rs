//! Amount type for monetary values coerced from loosely-typed record fields.
//!
//! Source records store money as JSON numbers, as strings carrying currency symbols and thousands
//! separators, or not at all. `Amount` always holds a finite `f64` so that sums over thousands of
//! records can never turn into `NaN`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

/// Represents a dollar amount.
///
/// # Examples
///
/// Strings are stripped down to digits, `.` and `-` before parsing:
/// ```
/// # use staffdesk::model::Amount;
/// let amount = Amount::parse("₹ 1,250.50");
/// assert_eq!(amount.value(), 1250.5);
/// ```
///
/// Anything unparsable is zero:
/// ```
/// # use staffdesk::model::Amount;
/// assert!(Amount::parse("n/a").is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    /// Creates a new `Amount`. Non-finite values become zero.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value)
        } else {
            Self::ZERO
        }
    }

    /// Turns an arbitrary field value into an amount. `null`, empty strings, booleans, objects and
    /// arrays are all zero. This never fails.
    pub fn coerce(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self::new(n.as_f64().unwrap_or_default()),
            Value::String(s) => Self::parse(s),
            _ => Self::ZERO,
        }
    }

    /// Parses a string after removing every character other than digits, `.` and `-`. The longest
    /// leading run that forms a number is used, e.g. `"12.5.3"` is `12.5`.
    pub fn parse(s: &str) -> Self {
        let cleaned: String = s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        Self::new(leading_float(&cleaned).unwrap_or_default())
    }

    /// Returns the underlying value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    /// Returns true if the amount is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }

    /// Returns the magnitude of the amount.
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }
}

/// Finds the longest prefix of `s` shaped like `-?\d*(\.\d*)?` that contains at least one digit.
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            digits += 1;
        }
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{sign}${}", format_num::format_num!(",.2", self.0.abs()))
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Amount::coerce(&value))
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl Add for Amount {
    type Output = Amount;

    /// Saturates at the largest finite value instead of overflowing to infinity.
    fn add(self, rhs: Self) -> Self::Output {
        Amount((self.0 + rhs.0).clamp(f64::MIN, f64::MAX))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount((self.0 - rhs.0).clamp(f64::MIN, f64::MAX))
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_number() {
        assert_eq!(Amount::coerce(&json!(500)).value(), 500.0);
        assert_eq!(Amount::coerce(&json!(-12.25)).value(), -12.25);
    }

    #[test]
    fn test_coerce_currency_string() {
        assert_eq!(Amount::coerce(&json!("$1,234.56")).value(), 1234.56);
        assert_eq!(Amount::coerce(&json!("INR 2,000")).value(), 2000.0);
        assert_eq!(Amount::coerce(&json!("-$60,000.00")).value(), -60000.0);
    }

    #[test]
    fn test_coerce_empty_and_null() {
        assert!(Amount::coerce(&Value::Null).is_zero());
        assert!(Amount::coerce(&json!("")).is_zero());
        assert!(Amount::coerce(&json!("   ")).is_zero());
    }

    #[test]
    fn test_coerce_garbage() {
        assert!(Amount::coerce(&json!("pending")).is_zero());
        assert!(Amount::coerce(&json!("-")).is_zero());
        assert!(Amount::coerce(&json!(".")).is_zero());
        assert!(Amount::coerce(&json!({"amount": 5})).is_zero());
        assert!(Amount::coerce(&json!([1, 2])).is_zero());
        assert!(Amount::coerce(&json!(true)).is_zero());
    }

    #[test]
    fn test_coerce_takes_leading_number() {
        assert_eq!(Amount::parse("12.5.3").value(), 12.5);
        assert_eq!(Amount::parse("100-200").value(), 100.0);
        assert_eq!(Amount::parse(".5").value(), 0.5);
        assert_eq!(Amount::parse("7.").value(), 7.0);
    }

    #[test]
    fn test_coerce_is_always_finite() {
        let inputs = [
            json!(null),
            json!(""),
            json!("abc"),
            json!("1e400"),
            json!("9".repeat(400)),
            json!(1.5),
            json!("--"),
        ];
        for input in inputs {
            assert!(Amount::coerce(&input).value().is_finite(), "{input}");
        }
    }

    #[test]
    fn test_new_non_finite_is_zero() {
        assert!(Amount::new(f64::NAN).is_zero());
        assert!(Amount::new(f64::INFINITY).is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Amount::new(1234.5).to_string(), "$1,234.50");
        assert_eq!(Amount::new(-60000.0).to_string(), "-$60,000.00");
        assert_eq!(Amount::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let total: Amount = [Amount::new(10.0), Amount::new(2.5), -Amount::new(0.5)]
            .into_iter()
            .sum();
        assert_eq!(total.value(), 12.0);
        assert_eq!((Amount::new(500.0) - Amount::new(200.0)).value(), 300.0);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let max = Amount::new(f64::MAX);
        assert_eq!((max + max).value(), f64::MAX);
        assert_eq!((-max - max).value(), f64::MIN);
        let total: Amount = [max, max, Amount::new(1.0)].into_iter().sum();
        assert_eq!(total.value(), f64::MAX);
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&Amount::new(50.0)).unwrap();
        assert_eq!(json, "50.0");
    }

    #[test]
    fn test_deserialize_coerces() {
        let amount: Amount = serde_json::from_str("\"$50.00\"").unwrap();
        assert_eq!(amount.value(), 50.0);
    }
}
