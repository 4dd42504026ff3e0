//! Whole-unit price representation.
//!
//! The restaurant prices everything in whole currency units (no kopecks), and
//! the menu table has always stored prices as digit-only text. [`Price`] keeps
//! that integer semantics while giving it a type.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from user or stored text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input contains something other than ASCII digits.
    #[error("price must contain digits only")]
    NotDigits,
    /// The value does not fit.
    #[error("price is too large")]
    TooLarge,
    /// Zero is not a valid menu price.
    #[error("price must be positive")]
    Zero,
}

/// An amount of money in whole currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from whole units.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Whole-unit amount.
    #[must_use]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Parse an amount that must consist of ASCII digits only.
    ///
    /// Leading and trailing whitespace is ignored. Zero is allowed here; use
    /// [`Price::parse_menu_price`] where the value must be positive.
    ///
    /// # Errors
    ///
    /// Returns an error for empty input, non-digit characters, or overflow.
    pub fn parse_digits(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PriceError::NotDigits);
        }
        s.parse::<i64>().map(Self).map_err(|_| PriceError::TooLarge)
    }

    /// Parse a menu price: digits only and strictly positive.
    ///
    /// # Errors
    ///
    /// Same as [`Price::parse_digits`], plus [`PriceError::Zero`].
    pub fn parse_menu_price(s: &str) -> Result<Self, PriceError> {
        let price = Self::parse_digits(s)?;
        if price.0 == 0 {
            return Err(PriceError::Zero);
        }
        Ok(price)
    }

    /// Format with a currency symbol, e.g. `450 ₽`.
    #[must_use]
    pub fn display(&self, symbol: &str) -> String {
        format!("{} {symbol}", self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Price {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
