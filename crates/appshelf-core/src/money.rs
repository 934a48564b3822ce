//! # Money Module
//!
//! Provides the `Money` type used for the revenue estimate in [`crate::stats`].
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Prices arrive from the remote store as JSON numbers (f64).            │
//! │  Summing f64 products in a different order gives a different total:    │
//! │    (0.1 + 0.2) + 0.3 != 0.1 + (0.2 + 0.3)                              │
//! │                                                                         │
//! │  OUR SOLUTION: round each price to cents ONCE, then use integers       │
//! │    price_cents × downloads summed as i64                               │
//! │    → the total never depends on record order                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use appshelf_core::money::Money;
//!
//! let price = Money::from_decimal(4.99);
//! assert_eq!(price.cents(), 499);
//!
//! let revenue = price.multiply_quantity(1_000);
//! assert_eq!(revenue.to_string(), "$4990.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

/// A monetary value in the smallest currency unit (cents).
///
/// Serialized as a bare integer of cents so the frontend formats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal price (as sent by the remote store) to cents.
    ///
    /// Rounds half away from zero. Non-finite input becomes zero.
    ///
    /// ```rust
    /// use appshelf_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(0.125).cents(), 13);
    /// assert_eq!(Money::from_decimal(f64::NAN).cents(), 0);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        // `as` saturates on overflow
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value as a decimal number, for display only.
    #[inline]
    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies money by a count (e.g. downloads). Saturates instead of wrapping.
    ///
    /// ## User Workflow
    /// ```text
    /// Pro app: $4.99
    /// Downloads: 1,000
    ///      │
    ///      ▼
    /// multiply_quantity(1000) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Estimated revenue: $4,990.00
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u64) -> Self {
        let qty = i64::try_from(qty).unwrap_or(i64::MAX);
        Money(self.0.saturating_mul(qty))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
