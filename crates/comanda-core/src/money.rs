//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A PIX payload printing that total would carry "0.30000000000000004"   │
//! │  or, after rounding at the wrong moment, a cent off the order.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    "7,50" is parsed ONCE into 750 centavos (half-up at the 3rd digit)  │
//! │    2 × 750 + 1 × 500 = 2000 centavos, exactly                          │
//! │    The payload prints 2000 as "20.00"                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::Money;
//!
//! let price = Money::parse("7,50").unwrap();
//! let total = price.multiply_quantity(2) + Money::from_cents(500);
//!
//! assert_eq!(total.to_decimal_string(), "20.00");
//! assert_eq!(total.format_brl(), "R$ 20,00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (BRL minor unit).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price_cents ──► LineItem.unit_price_cents (snapshot)          │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │                          quantity × unit price                          │
/// │                                   │                                     │
/// │                                   ▼                                     │
/// │  order total ──┬──► SettlementEvent.total ──► revenue dashboard        │
/// │                └──► PIX payload tag 54 ("20.00")                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_cents(1250); // R$ 12,50
    /// assert_eq!(price.cents(), 1250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Whether a settlement payload may be built for this amount.
    ///
    /// Zero and negative totals leave the cashier with nothing to charge.
    #[inline]
    pub const fn is_chargeable(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(750);
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 1500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Parses a decimal amount typed by a cashier.
    ///
    /// Equivalent to [`Money::parse_field`] with the field name `"amount"`.
    pub fn parse(input: &str) -> Result<Money, ValidationError> {
        Money::parse_field(input, "amount")
    }

    /// Parses a decimal amount, naming `field` in any validation error.
    ///
    /// ## Accepted Forms
    /// ```text
    /// "12,50"  → 1250     comma decimal separator (pt-BR keyboards)
    /// "12.5"   → 1250     dot decimal separator
    /// "7"      → 700
    /// ",5"     → 50
    /// "-3,00"  → -300     sign is accepted here; callers range-check
    /// "1.005"  → 101      third decimal rounds half-up
    /// "abc"    → InvalidFormat
    /// ```
    pub fn parse_field(input: &str, field: &str) -> Result<Money, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::required(field));
        }

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let normalized = unsigned.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((w, f)) => (w, f),
            None => (normalized.as_str(), ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(ValidationError::invalid_format(
                field,
                format!("'{}' is not a number", trimmed),
            ));
        }

        let overflow = || ValidationError::invalid_format(field, "value is too large");

        let whole_cents = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<i64>()
                .map_err(|_| overflow())?
                .checked_mul(100)
                .ok_or_else(overflow)?
        };

        let digit = |i: usize| -> i64 {
            fraction
                .as_bytes()
                .get(i)
                .map(|b| i64::from(b - b'0'))
                .unwrap_or(0)
        };
        let mut fraction_cents = digit(0) * 10 + digit(1);
        if digit(2) >= 5 {
            fraction_cents += 1;
        }

        let cents = whole_cents
            .checked_add(fraction_cents)
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Formats as a plain decimal with two places and a dot separator.
    ///
    /// This is the form tag 54 of a PIX payload carries.
    ///
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1250).to_decimal_string(), "12.50");
    /// assert_eq!(Money::zero().to_decimal_string(), "0.00");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.reais().abs(), self.cents_part())
    }

    /// Formats for display in pt-BR style: `R$ 1.234,56`.
    pub fn format_brl(&self) -> String {
        let digits = self.reais().abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}R$ {},{:02}", sign, grouped, self.cents_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_brl())
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
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
