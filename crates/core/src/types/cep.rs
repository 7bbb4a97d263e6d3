//! Brazilian postal code (CEP) type.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Errors that can occur when parsing a [`Cep`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CepError {
    /// The input string is empty.
    #[error("CEP cannot be empty")]
    Empty,
    /// The input contains something other than digits and separators.
    #[error("CEP may only contain digits, '-', '.' and spaces")]
    InvalidCharacter,
    /// The input does not have exactly 8 digits.
    #[error("CEP must have exactly 8 digits (got {digits})")]
    WrongLength {
        /// Number of digits found.
        digits: usize,
    },
}

/// A Brazilian postal code.
///
/// Stored as exactly 8 ASCII digits. Formatting characters (`-`, `.`, spaces)
/// are stripped while parsing, so `"01310-100"` and `"01310100"` are equal.
///
/// Because the value is always 8 zero-padded digits, lexicographic ordering
/// of the inner string matches numeric ordering, which is what rate-band
/// range checks rely on.
///
/// ## Examples
///
/// ```
/// use petshop_core::Cep;
///
/// let cep = Cep::parse("01310-100").unwrap();
/// assert_eq!(cep.as_str(), "01310100");
/// assert_eq!(cep.formatted(), "01310-100");
///
/// assert!(Cep::parse("1310-100").is_err());   // 7 digits
/// assert!(Cep::parse("01310-10a").is_err());  // letter
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Cep(String);

impl Cep {
    /// Number of digits in a CEP.
    pub const DIGITS: usize = 8;

    /// Parse a `Cep`, stripping `-`, `.` and whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains other characters, or
    /// does not have exactly 8 digits.
    pub fn parse(s: &str) -> Result<Self, CepError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CepError::Empty);
        }

        let mut digits = String::with_capacity(Self::DIGITS);
        for c in trimmed.chars() {
            match c {
                '0'..='9' => digits.push(c),
                '-' | '.' | ' ' => {}
                _ => return Err(CepError::InvalidCharacter),
            }
        }

        if digits.len() != Self::DIGITS {
            return Err(CepError::WrongLength {
                digits: digits.len(),
            });
        }

        Ok(Self(digits))
    }

    /// The 8 digits, without formatting.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form `NNNNN-NNN`.
    #[must_use]
    pub fn formatted(&self) -> String {
        let (head, tail) = self.0.split_at(5);
        format!("{head}-{tail}")
    }
}

/// Normalize a stored range boundary to 8 zero-padded digits.
///
/// Rate bands are configured by hand, so boundaries may arrive as
/// `"1000000"`, `"01000-000"` or `"01000000"`. Non-digits are dropped and the
/// result is left-padded with zeros.
#[must_use]
pub fn normalize_boundary(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    format!("{digits:0>width$}", width = Cep::DIGITS)
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl std::str::FromStr for Cep {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cep {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Cep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Cep {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Cep {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Cep {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_formatting() {
        assert_eq!(Cep::parse("01310-100").unwrap().as_str(), "01310100");
        assert_eq!(Cep::parse("01.310-100").unwrap().as_str(), "01310100");
        assert_eq!(Cep::parse(" 01310 100 ").unwrap().as_str(), "01310100");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Cep::parse("   "), Err(CepError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            Cep::parse("1310-100"),
            Err(CepError::WrongLength { digits: 7 })
        );
        assert_eq!(
            Cep::parse("013101000"),
            Err(CepError::WrongLength { digits: 9 })
        );
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(Cep::parse("0131O-100"), Err(CepError::InvalidCharacter));
    }

    #[test]
    fn test_display_is_formatted() {
        let cep = Cep::parse("01310100").unwrap();
        assert_eq!(cep.to_string(), "01310-100");
    }

    #[test]
    fn test_normalize_boundary() {
        assert_eq!(normalize_boundary("1000000"), "01000000");
        assert_eq!(normalize_boundary("01000-000"), "01000000");
        assert_eq!(normalize_boundary("99999999"), "99999999");
    }

    #[test]
    fn test_deserialize_validates() {
        let cep: Cep = serde_json::from_str("\"01310-100\"").unwrap();
        assert_eq!(cep.as_str(), "01310100");
        assert!(serde_json::from_str::<Cep>("\"123\"").is_err());
    }
}
