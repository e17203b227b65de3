//! DID parsing and normalization
//!
//! A DID is `did:<method>:<hex-public-key>`. Equality is case-insensitive on
//! the hex portion; everything is normalized to lowercase-hex on parse so
//! that later comparisons (ownership checks, ACL lookups) are plain string
//! equality.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    method: String,
    key_hex: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DidParseError {
    #[error("did must have the form did:<method>:<hex>")]
    MalformedShape,
    #[error("did method must not be empty")]
    EmptyMethod,
    #[error("did key must be valid hex")]
    InvalidHex,
}

impl Did {
    pub fn parse(raw: &str) -> Result<Self, DidParseError> {
        let mut parts = raw.splitn(3, ':');
        let scheme = parts.next().ok_or(DidParseError::MalformedShape)?;
        let method = parts.next().ok_or(DidParseError::MalformedShape)?;
        let key = parts.next().ok_or(DidParseError::MalformedShape)?;

        if scheme != "did" {
            return Err(DidParseError::MalformedShape);
        }
        if method.is_empty() {
            return Err(DidParseError::EmptyMethod);
        }
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DidParseError::InvalidHex);
        }

        Ok(Self {
            method: method.to_string(),
            key_hex: key.to_ascii_lowercase(),
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn key_hex(&self) -> &str {
        &self.key_hex
    }

    pub fn as_str(&self) -> String {
        format!("did:{}:{}", self.method, self.key_hex)
    }
}

impl TryFrom<String> for Did {
    type Error = DidParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Did::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.as_str()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_did() {
        let did = Did::parse("did:nil:AABBCC").unwrap();
        assert_eq!(did.method(), "nil");
        assert_eq!(did.key_hex(), "aabbcc");
    }

    #[test]
    fn equality_is_case_insensitive_on_hex() {
        let a = Did::parse("did:nil:AABBCC").unwrap();
        let b = Did::parse("did:nil:aabbcc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_missing_parts() {
        assert_eq!(Did::parse("did:nil"), Err(DidParseError::MalformedShape));
        assert_eq!(Did::parse("notdid:nil:aa"), Err(DidParseError::MalformedShape));
    }

    #[test]
    fn rejects_non_hex_key() {
        assert_eq!(Did::parse("did:nil:not-hex!"), Err(DidParseError::InvalidHex));
    }

    #[test]
    fn round_trips_through_display() {
        let did = Did::parse("did:nil:AABBCC").unwrap();
        assert_eq!(did.as_str(), "did:nil:aabbcc");
    }
}
