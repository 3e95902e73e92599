//! JSON-RPC client and the production [`ChainReader`].

use super::contracts::{
    decode_pool_state, decode_vesting_data, encode_get_pool_state, encode_get_vesting_data_of,
};
use super::{ChainError, ChainReader, PoolStateRecord, VestingTotals};
use crate::domain::Address;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Thin JSON-RPC 2.0 transport over HTTP.
#[derive(Debug)]
pub struct RpcTransport {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcTransport {
    /// Every request is bounded by `timeout`.
    pub fn new(url: String, timeout: Duration) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    /// Single attempt, no retry. Used for state-changing requests.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Timeout(format!("{} after request timeout", method))
                } else {
                    ChainError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Http {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        parse_response(body)
    }

    /// Read request with at most one retry on transient failure.
    pub async fn read(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let attempts = AtomicUsize::new(0);
        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let attempts = &attempts;
        let params = &params;
        retry(backoff, || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            self.request(method, params.clone()).await.map_err(|e| {
                if attempt == 0 && e.is_transient() {
                    debug!(method, error = %e, "retrying read once");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    /// `eth_call` against the latest block, returning raw return data.
    pub async fn eth_call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let params = json!([
            { "to": to.as_str(), "data": format!("0x{}", hex::encode(data)) },
            "latest"
        ]);
        let result = self.read("eth_call", params).await?;
        let hex_str = result
            .as_str()
            .ok_or_else(|| ChainError::Decode("eth_call result is not a string".to_string()))?;
        decode_hex_bytes(hex_str)
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let result = self.read("eth_chainId", json!([])).await?;
        parse_quantity(&result)
    }
}

fn parse_response(body: Value) -> Result<Value, ChainError> {
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown rpc error")
            .to_string();
        return Err(ChainError::Rpc { code, message });
    }
    body.get("result")
        .cloned()
        .ok_or_else(|| ChainError::Decode("response has neither result nor error".to_string()))
}

pub(crate) fn decode_hex_bytes(s: &str) -> Result<Vec<u8>, ChainError> {
    let body = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(body).map_err(|e| ChainError::Decode(format!("invalid hex data: {}", e)))
}

/// Parse a hex quantity such as `"0x2105"`.
pub(crate) fn parse_quantity(value: &Value) -> Result<u64, ChainError> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainError::Decode(format!("expected hex quantity, got {}", value)))?;
    let body = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(body, 16)
        .map_err(|e| ChainError::Decode(format!("invalid quantity {}: {}", s, e)))
}

/// [`ChainReader`] backed by `eth_call`.
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    transport: std::sync::Arc<RpcTransport>,
    pool_initializer: Address,
}

impl RpcChainReader {
    pub fn new(transport: std::sync::Arc<RpcTransport>, pool_initializer: Address) -> Self {
        Self {
            transport,
            pool_initializer,
        }
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn vesting_data(
        &self,
        token: &Address,
        account: &Address,
    ) -> Result<VestingTotals, ChainError> {
        debug!(token = %token, account = %account, "reading vesting data");
        let data = self
            .transport
            .eth_call(token, &encode_get_vesting_data_of(account))
            .await?;
        decode_vesting_data(&data)
    }

    async fn pool_state(&self, asset: &Address) -> Result<PoolStateRecord, ChainError> {
        debug!(asset = %asset, initializer = %self.pool_initializer, "reading pool state");
        let data = self
            .transport
            .eth_call(&self.pool_initializer, &encode_get_pool_state(asset))
            .await?;
        decode_pool_state(&data)
    }
}
