//! Phone number type for OTP sign-in.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is missing the leading `+` country prefix.
    #[error("phone number must start with a + country prefix")]
    MissingPlusPrefix,
    /// The digits are outside the allowed length range.
    #[error("phone number must have between {min} and {max} digits")]
    BadLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
    /// The input contains a non-digit character after the prefix.
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
}

/// An E.164-style phone number (`+` followed by 8-15 digits).
///
/// Spaces and hyphens in the input are tolerated and stripped; the stored
/// form is always `+<digits>`.
///
/// ## Examples
///
/// ```
/// use vastra_core::Phone;
///
/// let phone = Phone::parse("+91 98765 43210").unwrap();
/// assert_eq!(phone.as_str(), "+919876543210");
///
/// assert!(Phone::parse("9876543210").is_err()); // no country prefix
/// assert!(Phone::parse("+91abc").is_err());     // non-digit
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits after the `+`.
    pub const MIN_DIGITS: usize = 8;
    /// Maximum number of digits after the `+` (E.164 limit).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, missing the `+` prefix,
    /// contains characters other than digits/spaces/hyphens, or has a digit
    /// count outside 8-15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneError::Empty);
        }

        let rest = trimmed
            .strip_prefix('+')
            .ok_or(PhoneError::MissingPlusPrefix)?;

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if digits.len() < Self::MIN_DIGITS || digits.len() > Self::MAX_DIGITS {
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
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
