//! 20-byte account addresses.
//!
//! `Address::ZERO` is the sentinel for "outside the ledger": the source of
//! every mint and the sink of every burn. Component and test addresses are
//! derived deterministically from a label with SHA3-256.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address length in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Domain separator for `Address::derive`.
const DERIVE_DOMAIN: &[u8] = b"TALLY:ADDRESS:";

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address must be {expected} hex chars, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}

impl Address {
    /// Mint source / burn sink.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Deterministic address from a human label: last 20 bytes of
    /// SHA3-256("TALLY:ADDRESS:" || label).
    pub fn derive(label: &str) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(DERIVE_DOMAIN);
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
        Self(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Shortened form for log lines: `0x1234abcd…`.
    pub fn short(&self) -> String {
        format!("0x{}…", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if raw.len() != ADDRESS_LEN * 2 {
            return Err(AddressParseError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                got: raw.len(),
            });
        }
        let decoded = hex::decode(raw).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

// Hex string on the wire so addresses can key JSON maps.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sentinel() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::derive("alice").is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn test_derive_deterministic_and_distinct() {
        assert_eq!(Address::derive("alice"), Address::derive("alice"));
        assert_ne!(Address::derive("alice"), Address::derive("bob"));
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let addr = Address::derive("treasury");
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 42);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
        // Prefix is optional on input
        assert_eq!(text[2..].parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "0x1234".parse::<Address>(),
            Err(AddressParseError::InvalidLength { got: 4, .. })
        ));
        let not_hex = format!("0x{}", "zz".repeat(ADDRESS_LEN));
        assert!(matches!(
            not_hex.parse::<Address>(),
            Err(AddressParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::derive("carol");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
