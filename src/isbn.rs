//! ISBN cleaning, validation and normalization.
//!
//! Everything here is pure: raw user or scanner text goes in, a canonical
//! ISBN-13 (or a typed rejection) comes out. ISBN-10 input is converted to its
//! `978`-prefixed ISBN-13 form so the rest of the system only ever sees one
//! representation.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Which ISBN layout a failing input was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnKind {
    Isbn10,
    Isbn13,
}

impl fmt::Display for IsbnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsbnKind::Isbn10 => f.write_str("ISBN-10"),
            IsbnKind::Isbn13 => f.write_str("ISBN-13"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum IsbnError {
    #[error("ISBN cannot be empty")]
    Empty,

    #[error("Invalid ISBN length: {0}. Must be 10 or 13 characters")]
    Length(usize),

    #[error("Invalid {0} format")]
    Format(IsbnKind),

    #[error("Invalid {0} checksum")]
    Checksum(IsbnKind),
}

/// A validated ISBN in canonical 13-digit form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Isbn(String);

impl Isbn {
    /// Clean, validate and normalize `raw` into an ISBN-13.
    pub fn parse(raw: &str) -> Result<Self, IsbnError> {
        let cleaned = clean(raw);
        if cleaned.is_empty() {
            return Err(IsbnError::Empty);
        }

        match cleaned.chars().count() {
            13 => {
                check_isbn13(&cleaned)?;
                Ok(Self(cleaned))
            }
            10 => {
                check_isbn10(&cleaned)?;
                Ok(Self(convert_checked_isbn10(&cleaned)))
            }
            n => Err(IsbnError::Length(n)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Wrap a value read back from storage, which was normalized before insert.
    pub(crate) fn from_normalized(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Isbn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Strip hyphens and whitespace and uppercase the remainder.
pub fn clean(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn is_valid_isbn10(cleaned: &str) -> bool {
    check_isbn10(cleaned).is_ok()
}

pub fn is_valid_isbn13(cleaned: &str) -> bool {
    check_isbn13(cleaned).is_ok()
}

/// Convert a cleaned ISBN-10 into its ISBN-13 equivalent.
pub fn isbn10_to_isbn13(cleaned: &str) -> Result<String, IsbnError> {
    check_isbn10(cleaned)?;
    Ok(convert_checked_isbn10(cleaned))
}

fn check_isbn10(isbn: &str) -> Result<(), IsbnError> {
    if !isbn.is_ascii() {
        return Err(IsbnError::Format(IsbnKind::Isbn10));
    }
    let bytes = isbn.as_bytes();
    if bytes.len() != 10 {
        return Err(IsbnError::Length(bytes.len()));
    }
    let (body, check) = bytes.split_at(9);
    if !body.iter().all(u8::is_ascii_digit) {
        return Err(IsbnError::Format(IsbnKind::Isbn10));
    }
    let check_value = match check[0] {
        b'X' => 10,
        c if c.is_ascii_digit() => u32::from(c - b'0'),
        _ => return Err(IsbnError::Format(IsbnKind::Isbn10)),
    };

    let weighted: u32 = body
        .iter()
        .zip((2..=10).rev())
        .map(|(d, w)| u32::from(d - b'0') * w)
        .sum();

    if (weighted + check_value) % 11 == 0 {
        Ok(())
    } else {
        Err(IsbnError::Checksum(IsbnKind::Isbn10))
    }
}

fn check_isbn13(isbn: &str) -> Result<(), IsbnError> {
    let bytes = isbn.as_bytes();
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(IsbnError::Format(IsbnKind::Isbn13));
    }
    if bytes.len() != 13 {
        return Err(IsbnError::Length(bytes.len()));
    }
    if !(isbn.starts_with("978") || isbn.starts_with("979")) {
        return Err(IsbnError::Format(IsbnKind::Isbn13));
    }

    let expected = isbn13_check_digit(&bytes[..12]);
    if bytes[12] - b'0' == expected {
        Ok(())
    } else {
        Err(IsbnError::Checksum(IsbnKind::Isbn13))
    }
}

/// Check digit for the first twelve digits of an ISBN-13 (weights 1,3,1,3...).
fn isbn13_check_digit(first_twelve: &[u8]) -> u8 {
    let sum: u32 = first_twelve
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let weight = if i % 2 == 0 { 1 } else { 3 };
            u32::from(d - b'0') * weight
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

// Caller guarantees `isbn10` passed `check_isbn10`.
fn convert_checked_isbn10(isbn10: &str) -> String {
    let mut isbn13 = String::with_capacity(13);
    isbn13.push_str("978");
    isbn13.push_str(&isbn10[..9]);
    let check = isbn13_check_digit(isbn13.as_bytes());
    isbn13.push(char::from(b'0' + check));
    isbn13
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_separators_and_uppercases() {
        assert_eq!(clean("978-0-123456-78-9"), "9780123456789");
        assert_eq!(clean("0-123456-78-x"), "012345678X");
        assert_eq!(clean("  978 0 123456 78 9  "), "9780123456789");
        assert_eq!(clean("978\t0306\n406157"), "9780306406157");
        assert_eq!(clean(""), "");
    }

    #[test]
    fn validates_isbn10_checksums() {
        assert!(is_valid_isbn10("0306406152"));
        assert!(is_valid_isbn10("043942089X"));
        assert!(is_valid_isbn10("0201530821"));

        assert!(!is_valid_isbn10("0306406153"));
        assert!(!is_valid_isbn10("030640615"));
        assert!(!is_valid_isbn10("03064061522"));
        assert!(!is_valid_isbn10("030640615A"));
        assert!(!is_valid_isbn10("X306406152"));
        assert!(!is_valid_isbn10(""));
    }

    #[test]
    fn validates_isbn13_checksums_and_prefix() {
        assert!(is_valid_isbn13("9780306406157"));
        assert!(is_valid_isbn13("9780439420891"));
        assert!(is_valid_isbn13("9780201530827"));
        assert!(is_valid_isbn13("9791234567896"));

        assert!(!is_valid_isbn13("9780306406158"));
        assert!(!is_valid_isbn13("978030640615"));
        assert!(!is_valid_isbn13("97803064061577"));
        assert!(!is_valid_isbn13("978030640615A"));
        assert!(!is_valid_isbn13("1234567890123"));
        assert!(!is_valid_isbn13("9770306406157"));
        assert!(!is_valid_isbn13(""));
    }

    #[test]
    fn converts_isbn10_to_isbn13() {
        assert_eq!(isbn10_to_isbn13("0306406152").unwrap(), "9780306406157");
        assert_eq!(isbn10_to_isbn13("043942089X").unwrap(), "9780439420891");
        assert_eq!(isbn10_to_isbn13("0201530821").unwrap(), "9780201530827");
        assert_eq!(
            isbn10_to_isbn13("0306406153"),
            Err(IsbnError::Checksum(IsbnKind::Isbn10))
        );
    }

    #[test]
    fn parse_normalizes_both_forms() {
        let from13 = Isbn::parse("978-0-306-40615-7").unwrap();
        let from10 = Isbn::parse("0-306-40615-2").unwrap();
        assert_eq!(from13.as_str(), "9780306406157");
        assert_eq!(from10, from13);

        let lower_x = Isbn::parse("043942089x").unwrap();
        assert_eq!(lower_x.as_str(), "9780439420891");
    }

    #[test]
    fn parse_is_idempotent_on_its_output() {
        for raw in ["0306406152", "043942089X", "0201530821", "0-7432-7356-7"] {
            let once = Isbn::parse(raw).unwrap();
            let twice = Isbn::parse(once.as_str()).unwrap();
            assert_eq!(once, twice, "re-normalizing {raw} changed the value");
        }
    }

    #[test]
    fn corrupted_isbn13_check_digit_is_always_rejected() {
        let valid = "9780306406157";
        let good_check = valid.as_bytes()[12];
        for digit in b'0'..=b'9' {
            if digit == good_check {
                continue;
            }
            let mut corrupted = valid[..12].to_string();
            corrupted.push(char::from(digit));
            assert_eq!(
                Isbn::parse(&corrupted),
                Err(IsbnError::Checksum(IsbnKind::Isbn13)),
                "{corrupted} should be rejected"
            );
        }
    }

    #[test]
    fn parse_reports_typed_errors() {
        assert_eq!(Isbn::parse(""), Err(IsbnError::Empty));
        assert_eq!(Isbn::parse(" - - "), Err(IsbnError::Empty));
        assert_eq!(Isbn::parse("123456789"), Err(IsbnError::Length(9)));
        assert_eq!(
            Isbn::parse("9780306406158"),
            Err(IsbnError::Checksum(IsbnKind::Isbn13))
        );
        assert_eq!(
            Isbn::parse("0306406153"),
            Err(IsbnError::Checksum(IsbnKind::Isbn10))
        );
        assert_eq!(
            Isbn::parse("1234567890123"),
            Err(IsbnError::Format(IsbnKind::Isbn13))
        );
        assert_eq!(Isbn::parse("invalid-isbn"), Err(IsbnError::Length(11)));
    }

    #[test]
    fn error_messages_match_user_wording() {
        assert_eq!(IsbnError::Empty.to_string(), "ISBN cannot be empty");
        assert_eq!(
            IsbnError::Length(9).to_string(),
            "Invalid ISBN length: 9. Must be 10 or 13 characters"
        );
        assert_eq!(
            IsbnError::Checksum(IsbnKind::Isbn13).to_string(),
            "Invalid ISBN-13 checksum"
        );
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        assert!(matches!(Isbn::parse("９７８０３０６４０６１５７"), Err(_)));
        assert!(matches!(Isbn::parse("978030640615é"), Err(IsbnError::Format(_))));
    }
}
