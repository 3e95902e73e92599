//! Chain access: typed read calls and the signer used for claims.

use crate::domain::{Address, Amount, PoolKey};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod contracts;
pub mod mock;
pub mod rpc;
pub mod signer;

pub use mock::{MockChainReader, MockSigner};
pub use rpc::{RpcChainReader, RpcTransport};
pub use signer::{Receipt, RpcSigner, Signer};

/// Raw vesting totals for one holder at one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VestingTotals {
    pub total: Amount,
    pub released: Amount,
}

/// Pool state exactly as the initializer reports it; the status code is not
/// interpreted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStateRecord {
    pub numeraire: Address,
    pub status_code: u8,
    pub key: PoolKey,
    pub far_tick: i32,
}

/// Read-only contract calls the collector needs.
///
/// Implementations must bound every call with a timeout. At most one retry is
/// allowed, and only for transient failures.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// `getVestingDataOf(account)` on the token contract.
    async fn vesting_data(
        &self,
        token: &Address,
        account: &Address,
    ) -> Result<VestingTotals, ChainError>;

    /// `getPoolState(asset)` on the pool initializer.
    async fn pool_state(&self, asset: &Address) -> Result<PoolStateRecord, ChainError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Connection failure, DNS error or request timeout.
    #[error("network error: {0}")]
    Network(String),
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    /// JSON-RPC error object, including reverted calls.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

impl ChainError {
    /// Whether a read may be retried once.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Network(_) | ChainError::Timeout(_) => true,
            ChainError::Http { status, .. } => *status == 429 || *status >= 500,
            ChainError::Rpc { .. } | ChainError::Decode(_) => false,
        }
    }
}

impl From<crate::abi::AbiError> for ChainError {
    fn from(err: crate::abi::AbiError) -> Self {
        ChainError::Decode(err.to_string())
    }
}

impl From<crate::domain::AmountError> for ChainError {
    fn from(err: crate::domain::AmountError) -> Self {
        ChainError::Decode(err.to_string())
    }
}
