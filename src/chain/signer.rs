//! Transaction submission for claims.

use super::rpc::{parse_quantity, RpcTransport};
use super::ChainError;
use crate::domain::{Address, TxHash};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub block_number: u64,
    pub success: bool,
}

/// Account that can sign and submit transactions.
#[async_trait]
pub trait Signer: Send + Sync + fmt::Debug {
    /// Account transactions are sent from.
    fn account(&self) -> &Address;

    /// Submit a transaction. Never retried by implementations: a failed or
    /// ambiguous submission is reported to the caller as is.
    async fn submit(&self, to: &Address, data: Vec<u8>, value: u128)
        -> Result<TxHash, ChainError>;

    /// Wait until `tx_hash` is mined or the implementation's wait bound expires.
    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError>;
}

/// Signer that delegates key custody to the node (or a signing proxy in
/// front of it) through `eth_sendTransaction`.
#[derive(Debug, Clone)]
pub struct RpcSigner {
    transport: Arc<RpcTransport>,
    account: Address,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcSigner {
    pub fn new(
        transport: Arc<RpcTransport>,
        account: Address,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            transport,
            account,
            receipt_timeout,
            poll_interval,
        }
    }

    async fn poll_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError> {
        loop {
            let result = self
                .transport
                .read("eth_getTransactionReceipt", json!([tx_hash.as_str()]))
                .await?;
            if let Some(receipt) = parse_receipt(&result)? {
                return Ok(receipt);
            }
            debug!(tx_hash = %tx_hash, "receipt not yet available");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Signer for RpcSigner {
    fn account(&self) -> &Address {
        &self.account
    }

    async fn submit(
        &self,
        to: &Address,
        data: Vec<u8>,
        value: u128,
    ) -> Result<TxHash, ChainError> {
        let params = json!([{
            "from": self.account().as_str(),
            "to": to.as_str(),
            "data": format!("0x{}", hex::encode(&data)),
            "value": format!("0x{:x}", value),
        }]);
        let result = self.transport.request("eth_sendTransaction", params).await?;
        let hash = result
            .as_str()
            .ok_or_else(|| ChainError::Decode("transaction hash is not a string".to_string()))?;
        let tx_hash = TxHash::new(hash.to_string());
        info!(tx_hash = %tx_hash, to = %to, "transaction submitted");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError> {
        tokio::time::timeout(self.receipt_timeout, self.poll_receipt(tx_hash))
            .await
            .map_err(|_| {
                ChainError::Timeout(format!(
                    "no receipt for {} within {}ms",
                    tx_hash,
                    self.receipt_timeout.as_millis()
                ))
            })?
    }
}

/// `null` while pending, otherwise block number and status.
fn parse_receipt(value: &Value) -> Result<Option<Receipt>, ChainError> {
    if value.is_null() {
        return Ok(None);
    }
    let block = value
        .get("blockNumber")
        .ok_or_else(|| ChainError::Decode("receipt without blockNumber".to_string()))?;
    if block.is_null() {
        return Ok(None);
    }
    let block_number = parse_quantity(block)?;
    let status = value
        .get("status")
        .ok_or_else(|| ChainError::Decode("receipt without status".to_string()))?;
    let success = parse_quantity(status)? == 1;
    Ok(Some(Receipt {
        block_number,
        success,
    }))
}
