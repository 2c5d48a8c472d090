//! Prices in minor currency units.
//!
//! The backend stores every price as an integer number of cents. Formatting
//! for display goes through `rust_decimal` so no float rounding sneaks in.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A USD price expressed in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero dollars.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount in dollars with two decimal places.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Clamp into `[min, max]`.
    #[must_use]
    pub fn clamp_between(self, min: Self, max: Self) -> Self {
        if max < min {
            return min;
        }
        Self(self.0.clamp(min.0, max.0))
    }
}

impl From<i64> for Price {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

/// Formats as US currency, e.g. `$1,234.56`.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.to_decimal();
        let sign = if amount.is_sign_negative() { "-" } else { "" };
        let fixed = format!("{:.2}", amount.abs());
        let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{sign}${grouped}.{fraction}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_cents() {
        assert_eq!(Price::from_cents(0).to_string(), "$0.00");
        assert_eq!(Price::from_cents(5).to_string(), "$0.05");
        assert_eq!(Price::from_cents(99_999).to_string(), "$999.99");
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Price::from_cents(123_456).to_string(), "$1,234.56");
        assert_eq!(Price::from_cents(100_000_000).to_string(), "$1,000,000.00");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::from_cents(-1_050).to_string(), "-$10.50");
    }

    #[test]
    fn test_clamp_between() {
        let min = Price::from_cents(100);
        let max = Price::from_cents(500);
        assert_eq!(Price::from_cents(50).clamp_between(min, max), min);
        assert_eq!(Price::from_cents(900).clamp_between(min, max), max);
        assert_eq!(
            Price::from_cents(250).clamp_between(min, max),
            Price::from_cents(250)
        );
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Price::from_cents(1999).to_decimal().to_string(), "19.99");
    }
}
