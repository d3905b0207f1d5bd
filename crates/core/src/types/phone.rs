//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneNumberError {
    /// The input string is empty or whitespace-only.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("phone number must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character other than digits, `+`, `-`, or
    /// whitespace.
    #[error("phone number contains invalid character: {0:?}")]
    InvalidCharacter(char),
    /// The input contains no digits at all.
    #[error("phone number must contain at least one digit")]
    NoDigits,
}

/// A subscriber's WhatsApp phone number.
///
/// The value is stored exactly as the customer entered it - `+` prefix and
/// internal spacing are preserved. Normalization to the bare-digit form the
/// WhatsApp Cloud API expects happens only at send time, via
/// [`PhoneNumber::wa_recipient`].
///
/// ## Examples
///
/// ```
/// use restock_alerts_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("+1 555 0100").unwrap();
/// assert_eq!(phone.as_str(), "+1 555 0100");
/// assert_eq!(phone.wa_recipient(), "15550100");
///
/// assert!(PhoneNumber::parse("").is_err());
/// assert!(PhoneNumber::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Maximum length of a stored phone number, formatting included.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a `PhoneNumber` from a string.
    ///
    /// Accepts digits, a `+` prefix, and internal whitespace. The stored
    /// value keeps the original formatting.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty or whitespace-only
    /// - Is longer than 32 characters
    /// - Contains characters other than digits, `+`, `-`, or whitespace
    /// - Contains no digits
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        if trimmed.len() > Self::MAX_LENGTH {
            return Err(PhoneNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        for c in trimmed.chars() {
            if !c.is_ascii_digit() && c != '+' && c != '-' && !c.is_whitespace() {
                return Err(PhoneNumberError::InvalidCharacter(c));
            }
        }

        if !trimmed.chars().any(|c| c.is_ascii_digit()) {
            return Err(PhoneNumberError::NoDigits);
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the phone number as entered, formatting preserved.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the send-time recipient form: `+`, `-`, and whitespace
    /// stripped, digits only.
    ///
    /// The WhatsApp Cloud API rejects recipients with a leading `+` or
    /// internal spacing, so this is applied immediately before dispatch and
    /// never written back to storage.
    #[must_use]
    pub fn wa_recipient(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_formatting() {
        let phone = PhoneNumber::parse("+92 300 1234567").expect("valid phone");
        assert_eq!(phone.as_str(), "+92 300 1234567");
    }

    #[test]
    fn test_parse_trims_outer_whitespace() {
        let phone = PhoneNumber::parse("  15550100 ").expect("valid phone");
        assert_eq!(phone.as_str(), "15550100");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            PhoneNumber::parse(""),
            Err(PhoneNumberError::Empty)
        ));
        assert!(matches!(
            PhoneNumber::parse("   "),
            Err(PhoneNumberError::Empty)
        ));
        assert!(matches!(
            PhoneNumber::parse("call-me-maybe"),
            Err(PhoneNumberError::InvalidCharacter(_))
        ));
        assert!(matches!(
            PhoneNumber::parse("+ -"),
            Err(PhoneNumberError::NoDigits)
        ));
        assert!(matches!(
            PhoneNumber::parse(&"9".repeat(40)),
            Err(PhoneNumberError::TooLong { .. })
        ));
    }

    #[test]
    fn test_wa_recipient_strips_plus_and_spaces() {
        let phone = PhoneNumber::parse("+1 555 0100").expect("valid phone");
        assert_eq!(phone.wa_recipient(), "15550100");

        let phone = PhoneNumber::parse("92-300-1234567").expect("valid phone");
        assert_eq!(phone.wa_recipient(), "923001234567");
    }

    #[test]
    fn test_already_normalized_passthrough() {
        let phone = PhoneNumber::parse("15550100").expect("valid phone");
        assert_eq!(phone.wa_recipient(), "15550100");
    }
}
