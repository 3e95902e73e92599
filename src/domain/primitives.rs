//! Domain primitives: TimeMs, Address, TxHash.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering, used for human-facing fields.
    pub fn to_rfc3339(&self) -> String {
        chrono::DateTime::from_timestamp_millis(self.0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.0.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must be 20 bytes (40 hex chars): {0}")]
    BadLength(String),
    #[error("address contains non-hex characters: {0}")]
    NotHex(String),
}

/// 20-byte account or contract address, stored lowercase with a `0x` prefix.
///
/// Lowercasing on construction makes equality case-insensitive, which is what
/// numeraire matching between entities relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Address(String);

impl Address {
    /// Parse and normalize a hex address.
    pub fn parse(s: &str) -> Result<Self, AddressParseError> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressParseError::MissingPrefix(s.to_string()))?;
        if body.len() != 40 {
            return Err(AddressParseError::BadLength(s.to_string()));
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressParseError::NotHex(s.to_string()));
        }
        Ok(Address(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// Build an address from its raw 20 bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(format!("0x{}", hex::encode(bytes)))
    }

    /// The raw 20 bytes of this address.
    pub fn to_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        // Construction guarantees 40 valid hex chars after the prefix.
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&decoded);
        }
        out
    }

    /// The zero address.
    pub fn zero() -> Self {
        Address::from_bytes([0u8; 20])
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: String) -> Self {
        TxHash(hash.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalizes_case() {
        let a = Address::parse("0xABCDEFabcdef0123456789ABCDEF0123456789ab").unwrap();
        let b = Address::parse("0xabcdefabcdef0123456789abcdef0123456789AB").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "0xabcdefabcdef0123456789abcdef0123456789ab");
    }

    #[test]
    fn test_address_rejects_malformed() {
        assert!(matches!(
            Address::parse("abcdefabcdef0123456789abcdef0123456789ab"),
            Err(AddressParseError::MissingPrefix(_))
        ));
        assert!(matches!(
            Address::parse("0x1234"),
            Err(AddressParseError::BadLength(_))
        ));
        assert!(matches!(
            Address::parse("0xzzcdefabcdef0123456789abcdef0123456789ab"),
            Err(AddressParseError::NotHex(_))
        ));
    }

    #[test]
    fn test_address_bytes_roundtrip() {
        let addr = Address::parse("0x00000000000000000000000000000000000000ff").unwrap();
        let bytes = addr.to_bytes();
        assert_eq!(bytes[19], 0xff);
        assert_eq!(Address::from_bytes(bytes), addr);
    }

    #[test]
    fn test_address_deserialize_validates() {
        let ok: Result<Address, _> =
            serde_json::from_str("\"0x00000000000000000000000000000000000000AA\"");
        assert_eq!(
            ok.unwrap().as_str(),
            "0x00000000000000000000000000000000000000aa"
        );
        let bad: Result<Address, _> = serde_json::from_str("\"0x12\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_timems_ordering() {
        let t1 = TimeMs::new(1000);
        let t2 = TimeMs::new(2000);
        assert!(t1 < t2);
    }
}
