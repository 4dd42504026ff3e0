//! Customer phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input has too few or too many digits.
    #[error("phone number must have between {min} and {max} digits")]
    BadLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
    /// The input contains something other than digits, spaces, dashes,
    /// parentheses or a leading plus.
    #[error("phone number contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A phone number shared by the customer through a Telegram contact.
///
/// Telegram delivers contacts with or without a leading `+` depending on the
/// client, so the number is normalized to `+` followed by digits.
///
/// ## Examples
///
/// ```
/// use hearty_house_core::Phone;
///
/// assert_eq!(Phone::parse("79001234567").unwrap().as_str(), "+79001234567");
/// assert_eq!(Phone::parse("+7 (900) 123-45-67").unwrap().as_str(), "+79001234567");
/// assert!(Phone::parse("").is_err());
/// assert!(Phone::parse("12ab").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits (E.164 short numbers are rejected).
    pub const MIN_DIGITS: usize = 7;
    /// Maximum number of digits (E.164 limit).
    pub const MAX_DIGITS: usize = 15;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains unexpected characters,
    /// or has a digit count outside `7..=15`.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut digits = String::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            match c {
                '0'..='9' => digits.push(c),
                '+' if i == 0 => {}
                ' ' | '-' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::BadLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the normalized phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
