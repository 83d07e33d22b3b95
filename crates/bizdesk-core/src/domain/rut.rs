//! Chilean RUT (Rol Único Tributario)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// A validated RUT in canonical form `NNNNNNNN-D`: no dots, upper-case `K`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rut(String);

impl Rut {
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let cleaned: String = input
            .chars()
            .filter(|c| !matches!(c, '.' | ' ' | '-'))
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if cleaned.len() < 2 {
            return Err(DomainError::Validation(format!("Invalid RUT: {}", input)));
        }
        let (body, dv) = cleaned.split_at(cleaned.len() - 1);
        if body.len() > 9 || !body.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::Validation(format!("Invalid RUT: {}", input)));
        }
        let body = body.trim_start_matches('0');
        if body.is_empty() {
            return Err(DomainError::Validation(format!("Invalid RUT: {}", input)));
        }

        let expected = check_digit(body);
        if dv.chars().next() != Some(expected) {
            return Err(DomainError::Validation(format!(
                "Invalid RUT check digit: {}",
                input
            )));
        }

        Ok(Rut(format!("{}-{}", body, expected)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits before the check digit.
    pub fn body(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

/// Modulo-11 check digit for the numeric body of a RUT.
pub fn check_digit(body: &str) -> char {
    let sum: u32 = body
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .zip([2u32, 3, 4, 5, 6, 7].iter().cycle())
        .map(|(d, w)| d * w)
        .sum();
    match 11 - (sum % 11) {
        11 => '0',
        10 => 'K',
        n => char::from_digit(n, 10).unwrap_or('0'),
    }
}

/// Normalises an optional user-supplied RUT, treating blank as absent.
pub fn parse_optional(input: Option<&str>) -> Result<Option<Rut>, DomainError> {
    match input.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Rut::parse(s).map(Some),
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Rut {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rut::parse(&value)
    }
}

impl From<Rut> for String {
    fn from(rut: Rut) -> Self {
        rut.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!(Rut::parse("12.345.678-5").unwrap().as_str(), "12345678-5");
        assert_eq!(Rut::parse("123456785").unwrap().as_str(), "12345678-5");
        assert_eq!(Rut::parse(" 76.086.428-5 ").unwrap().as_str(), "76086428-5");
    }

    #[test]
    fn test_k_check_digit() {
        assert_eq!(check_digit("10000013"), 'K');
        assert_eq!(Rut::parse("10.000.013-k").unwrap().as_str(), "10000013-K");
    }

    #[test]
    fn test_zero_check_digit() {
        // 11 - (sum % 11) == 11 maps to '0'
        let body = (1..100_000u32)
            .map(|n| n.to_string())
            .find(|b| check_digit(b) == '0')
            .unwrap();
        let rut = format!("{}-0", body);
        assert!(Rut::parse(&rut).is_ok());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Rut::parse("12.345.678-9").is_err());
        assert!(Rut::parse("abc").is_err());
        assert!(Rut::parse("-").is_err());
        assert!(Rut::parse("0-0").is_err());
    }

    #[test]
    fn test_parse_optional_blank() {
        assert_eq!(parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(parse_optional(None).unwrap(), None);
        assert!(parse_optional(Some("11.111.111-1")).unwrap().is_some());
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let ok: Rut = serde_json::from_str("\"11.111.111-1\"").unwrap();
        assert_eq!(ok.as_str(), "11111111-1");
        assert!(serde_json::from_str::<Rut>("\"11.111.111-2\"").is_err());
    }
}
