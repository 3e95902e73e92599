//! Minimal Solidity ABI encoding for the static types the engine uses.
//!
//! Every value occupies one 32-byte word: addresses and unsigned integers are
//! left-padded with zeros, signed integers are sign-extended.

use crate::domain::Address;
use sha3::{Digest, Keccak256};
use thiserror::Error;

pub type Word = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("return data too short: expected {expected} words, got {actual} bytes")]
    TooShort { expected: usize, actual: usize },
    #[error("word {index} is not a valid {kind}")]
    OutOfRange { index: usize, kind: &'static str },
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Word {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Four-byte function selector for a canonical signature such as
/// `getPoolState(address)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_address(address: &Address) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&address.to_bytes());
    word
}

pub fn encode_uint(value: u128) -> Word {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn encode_int(value: i64) -> Word {
    let fill = if value < 0 { 0xff } else { 0x00 };
    let mut word = [fill; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Selector followed by the head words of a call with static arguments.
pub fn encode_call(selector: [u8; 4], args: &[Word]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

/// Read-only view over ABI-encoded return data.
#[derive(Debug, Clone, Copy)]
pub struct Words<'a> {
    data: &'a [u8],
}

impl<'a> Words<'a> {
    /// Wrap return data that must contain at least `expected` words.
    pub fn new(data: &'a [u8], expected: usize) -> Result<Self, AbiError> {
        if data.len() < expected * 32 {
            return Err(AbiError::TooShort {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    fn word(&self, index: usize) -> &'a [u8] {
        &self.data[index * 32..(index + 1) * 32]
    }

    pub fn address(&self, index: usize) -> Result<Address, AbiError> {
        let word = self.word(index);
        if word[..12].iter().any(|b| *b != 0) {
            return Err(AbiError::OutOfRange {
                index,
                kind: "address",
            });
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::from_bytes(bytes))
    }

    /// Unsigned integer that must fit in 128 bits.
    pub fn uint(&self, index: usize) -> Result<u128, AbiError> {
        let word = self.word(index);
        if word[..16].iter().any(|b| *b != 0) {
            return Err(AbiError::OutOfRange {
                index,
                kind: "uint128",
            });
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(bytes))
    }

    pub fn uint8(&self, index: usize) -> Result<u8, AbiError> {
        let value = self.uint(index)?;
        u8::try_from(value).map_err(|_| AbiError::OutOfRange { index, kind: "uint8" })
    }

    pub fn uint24(&self, index: usize) -> Result<u32, AbiError> {
        let value = self.uint(index)?;
        if value >= 1 << 24 {
            return Err(AbiError::OutOfRange {
                index,
                kind: "uint24",
            });
        }
        Ok(value as u32)
    }

    pub fn int24(&self, index: usize) -> Result<i32, AbiError> {
        let word = self.word(index);
        let negative = word[31 - 2] & 0x80 != 0;
        let fill = if negative { 0xff } else { 0x00 };
        if word[..29].iter().any(|b| *b != fill) {
            return Err(AbiError::OutOfRange {
                index,
                kind: "int24",
            });
        }
        let raw = i32::from_be_bytes([fill, word[29], word[30], word[31]]);
        Ok(raw)
    }
}
