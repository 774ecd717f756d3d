//! # Money Module
//!
//! Provides the `Money` type for handling soles (PEN) safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  IGV split on a S/ 10.00 receipt in floats:                             │
//! │    10 / 1.18 = 8.474576...  → base and IGV drift by a céntimo          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Céntimos                                         │
//! │    base = round(1000 × 10000 / 11800) = 847                            │
//! │    igv  = 1000 − 847 = 153   (base + igv == total, always)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cajas_core::money::Money;
//!
//! let price = Money::from_cents(1099); // S/ 10.99
//! let doubled = price * 2;             // S/ 21.98
//! assert_eq!(doubled.to_decimal_string(), "21.98");
//!
//! let parsed = Money::parse_decimal("12.5").unwrap();
//! assert_eq!(parsed.cents(), 1250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in céntimos (1/100 of a sol).
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► SaleLine.unit_price ──► SaleLine.subtotal
///                                                      │
///                      Sale.total ◄────── sum ─────────┘
///                          │
///                          ├──► split_inclusive(IGV) ──► (op. gravada, IGV)
///                          │
///                          └──► Payment / Invoice / QR payload
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from céntimos.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in céntimos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole soles portion.
    #[inline]
    pub const fn soles(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the céntimos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use cajas_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).map(|m| m.cents()), Some(897));
    /// assert!(Money::from_cents(i64::MAX).multiply_quantity(2).is_none());
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Splits a tax-inclusive amount into `(taxable base, tax)`.
    ///
    /// ## Implementation
    /// Integer math only: `base = (total × 10000 + half) / (10000 + bps)`,
    /// rounded half up, then `tax = total − base`. The two parts always add
    /// back up to the original amount.
    ///
    /// ## Example
    /// ```rust
    /// use cajas_core::money::Money;
    /// use cajas_core::types::TaxRate;
    ///
    /// let total = Money::from_cents(11800); // S/ 118.00 including IGV
    /// let (base, igv) = total.split_inclusive(TaxRate::from_bps(1800));
    /// assert_eq!(base.cents(), 10000);
    /// assert_eq!(igv.cents(), 1800);
    /// ```
    pub fn split_inclusive(&self, rate: TaxRate) -> (Money, Money) {
        let divisor = 10_000i128 + rate.bps() as i128;
        let scaled = self.0 as i128 * 10_000;
        // Round half away from zero
        let base = if scaled >= 0 {
            (scaled + divisor / 2) / divisor
        } else {
            (scaled - divisor / 2) / divisor
        };
        let base = Money::from_cents(base as i64);
        (base, *self - base)
    }

    /// Formats the amount as a plain decimal (`1234.56`), as used in SUNAT
    /// payloads and JSON reports.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.soles().abs(), self.cents_part())
    }

    /// Parses a decimal amount in soles (`"12"`, `"12.5"`, `"12.50"`).
    ///
    /// Returns `None` for malformed input or more than two decimals.
    pub fn parse_decimal(input: &str) -> Option<Money> {
        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if frac.len() > 2 || !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().ok()? * 10,
            _ => frac.parse().ok()?,
        };

        let cents = whole.checked_mul(100)?.checked_add(frac)?;
        Some(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display uses the Peruvian receipt format: `S/ 1,234.56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = self.soles().abs().to_string();

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}S/ {}.{:02}", sign, grouped, self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// Saturates at the `i64` bounds. Use [`Money::checked_add`] where an
/// overflow must be reported.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Decimal (soles) serde helpers
// =============================================================================

/// Deserializes a soles amount given either as a JSON number (`12.5`) or a
/// string (`"12.50"`).
///
/// ## Usage
/// ```rust
/// use cajas_core::money::{self, Money};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Body {
///     #[serde(deserialize_with = "money::decimal::deserialize")]
///     precio: Money,
/// }
///
/// let body: Body = serde_json::from_str(r#"{"precio": 12.5}"#).unwrap();
/// assert_eq!(body.precio.cents(), 1250);
/// ```
pub mod decimal {
    use super::Money;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(serde_json::Number),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        Money::parse_decimal(&text)
            .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", text)))
    }

    /// Same as [`deserialize`] for optional fields.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Raw> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) => {
                let text = match raw {
                    Raw::Number(n) => n.to_string(),
                    Raw::Text(s) => s,
                };
                Money::parse_decimal(&text)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid amount: {}", text)))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.soles(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_cents(123456).to_string(), "S/ 1,234.56");
        assert_eq!(Money::from_cents(500).to_string(), "S/ 5.00");
        assert_eq!(Money::from_cents(100000000).to_string(), "S/ 1,000,000.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-S/ 5.50");
    }

    #[test]
    fn test_decimal_string() {
        assert_eq!(Money::from_cents(123456).to_decimal_string(), "1234.56");
        assert_eq!(Money::from_cents(7).to_decimal_string(), "0.07");
        assert_eq!(Money::zero().to_decimal_string(), "0.00");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("12").map(|m| m.cents()), Some(1200));
        assert_eq!(Money::parse_decimal("12.5").map(|m| m.cents()), Some(1250));
        assert_eq!(Money::parse_decimal("12.05").map(|m| m.cents()), Some(1205));
        assert_eq!(Money::parse_decimal(".5").map(|m| m.cents()), Some(50));
        assert_eq!(Money::parse_decimal("-3.10").map(|m| m.cents()), Some(-310));
        assert!(Money::parse_decimal("12.345").is_none());
        assert!(Money::parse_decimal("abc").is_none());
        assert!(Money::parse_decimal("").is_none());
        assert!(Money::parse_decimal("1e3").is_none());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_overflow_is_detected_or_saturates() {
        let huge = Money::from_cents(i64::MAX / 2 + 1);

        assert!(huge.multiply_quantity(2).is_none());
        assert!(huge.checked_add(huge).is_none());
        assert_eq!(huge.checked_add(Money::from_cents(1)).map(|m| m.cents()), Some(i64::MAX / 2 + 2));

        assert_eq!((huge + huge).cents(), i64::MAX);
        assert_eq!((huge * 3).cents(), i64::MAX);
        let total: Money = vec![huge, huge, huge].into_iter().sum();
        assert_eq!(total.cents(), i64::MAX);
    }

    #[test]
    fn test_split_inclusive_exact() {
        let (base, igv) = Money::from_cents(11800).split_inclusive(TaxRate::from_bps(1800));
        assert_eq!(base.cents(), 10000);
        assert_eq!(igv.cents(), 1800);
    }

    #[test]
    fn test_split_inclusive_rounds_and_balances() {
        // 10.00 / 1.18 = 8.4745... → 8.47
        let total = Money::from_cents(1000);
        let (base, igv) = total.split_inclusive(TaxRate::from_bps(1800));
        assert_eq!(base.cents(), 847);
        assert_eq!(igv.cents(), 153);

        for cents in [1, 2, 99, 101, 12345, 999_999] {
            let total = Money::from_cents(cents);
            let (base, igv) = total.split_inclusive(TaxRate::from_bps(1800));
            assert_eq!(base + igv, total, "split of {} must balance", cents);
        }
    }

    #[test]
    fn test_split_inclusive_zero_rate() {
        let (base, tax) = Money::from_cents(1234).split_inclusive(TaxRate::zero());
        assert_eq!(base.cents(), 1234);
        assert!(tax.is_zero());
    }

    #[test]
    fn test_decimal_deserialize() {
        #[derive(serde::Deserialize)]
        struct Body {
            #[serde(deserialize_with = "decimal::deserialize")]
            precio: Money,
            #[serde(default, deserialize_with = "decimal::deserialize_option")]
            descuento: Option<Money>,
        }

        let body: Body = serde_json::from_str(r#"{"precio": "7.9"}"#).unwrap();
        assert_eq!(body.precio.cents(), 790);
        assert!(body.descuento.is_none());

        let body: Body = serde_json::from_str(r#"{"precio": 3, "descuento": 0.25}"#).unwrap();
        assert_eq!(body.precio.cents(), 300);
        assert_eq!(body.descuento.map(|m| m.cents()), Some(25));

        assert!(serde_json::from_str::<Body>(r#"{"precio": "x"}"#).is_err());
    }
}
