//! Phone number value object

use super::error::{DomainError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MIN_DIGITS: usize = 3;
const MAX_DIGITS: usize = 15;

/// A dialable phone number, normalized to an optional leading `+` and digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse user input such as `+1 (734) 521-4522` into `+17345214522`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DomainError::ValidationError(
                "phone number is required".to_string(),
            ));
        }

        let compact: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
            .collect();

        let digits = compact.strip_prefix('+').unwrap_or(&compact);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::ValidationError(format!(
                "phone number '{}' may only contain digits and a leading '+'",
                trimmed
            )));
        }
        if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
            return Err(DomainError::ValidationError(format!(
                "phone number '{}' must have between {} and {} digits",
                trimmed, MIN_DIGITS, MAX_DIGITS
            )));
        }

        Ok(Self(compact))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `tel:` URI used as a SIP transfer target
    pub fn tel_uri(&self) -> String {
        format!("tel:{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PhoneNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for PhoneNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        PhoneNumber::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_separators() {
        let number = PhoneNumber::parse(" +1 (734) 521-4522 ").unwrap();
        assert_eq!(number.as_str(), "+17345214522");
        assert_eq!(number.to_string(), "+17345214522");
    }

    #[test]
    fn test_parse_without_plus() {
        let number = PhoneNumber::parse("918980579954").unwrap();
        assert_eq!(number.as_str(), "918980579954");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(
            PhoneNumber::parse("   "),
            Err(DomainError::ValidationError(
                "phone number is required".to_string()
            ))
        );
    }

    #[test]
    fn test_parse_rejects_letters_and_bad_length() {
        assert!(PhoneNumber::parse("+1800FLOWERS").is_err());
        assert!(PhoneNumber::parse("+12").is_err());
        assert!(PhoneNumber::parse("+1234567890123456").is_err());
        assert!(PhoneNumber::parse("1+234").is_err());
    }

    #[test]
    fn test_tel_uri() {
        let number = PhoneNumber::parse("+17345214522").unwrap();
        assert_eq!(number.tel_uri(), "tel:+17345214522");
    }

    #[test]
    fn test_serde_validates() {
        let number: PhoneNumber = serde_json::from_str("\"+1 555 0100\"").unwrap();
        assert_eq!(number.as_str(), "+15550100");
        assert!(serde_json::from_str::<PhoneNumber>("\"call me\"").is_err());
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"+15550100\"");
    }
}
