//! Token amounts in base units, backed by rust_decimal.
//!
//! On-chain amounts are `uint256`, but anything a vesting contract or pool
//! reports for a single holder fits the 96-bit mantissa of `rust_decimal`.
//! Wider values are rejected at decode time instead of being truncated.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest raw integer an `Amount` can hold (2^96 - 1).
pub const MAX_RAW: u128 = (1u128 << 96) - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount exceeds 96 bits: {0}")]
    Overflow(u128),
    #[error("amount must be an integer in base units: {0}")]
    Fractional(String),
    #[error("invalid amount: {0}")]
    Parse(String),
}

/// Integer amount of token base units (wei-style).
///
/// Signed so that inconsistent readings (released above total) stay
/// representable long enough to be reported. Serializes as a JSON string to
/// keep all digits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(#[serde(with = "rust_decimal::serde::str")] RustDecimal);

impl Amount {
    /// Build from an unsigned raw integer, as decoded from a `uint256` word.
    pub fn from_raw(raw: u128) -> Result<Self, AmountError> {
        if raw > MAX_RAW {
            return Err(AmountError::Overflow(raw));
        }
        RustDecimal::try_from_i128_with_scale(raw as i128, 0)
            .map(Amount)
            .map_err(|_| AmountError::Overflow(raw))
    }

    /// Parse a base-unit integer string ("1000000000000000000").
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let value = RustDecimal::from_str(s.trim()).map_err(|e| AmountError::Parse(e.to_string()))?;
        if !value.fract().is_zero() {
            return Err(AmountError::Fractional(s.to_string()));
        }
        Ok(Amount(value.trunc()))
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Amount(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// `None` when the sum leaves the 96-bit range.
    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Canonical integer rendering (no exponent, no trailing zeros).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Operands are readings within `MAX_RAW` of zero, so the difference always
/// fits the 96-bit mantissa.
impl std::ops::Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}
