//! Pool configuration, identity and lifecycle status.

use crate::domain::Address;
use serde::{Deserialize, Serialize};

/// Pool lifecycle status, in on-chain enum order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolStatus {
    NotInitialized,
    Initializing,
    Active,
    Migrating,
    Migrated,
}

impl PoolStatus {
    /// Map the `uint8` status code returned by the initializer.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PoolStatus::NotInitialized),
            1 => Some(PoolStatus::Initializing),
            2 => Some(PoolStatus::Active),
            3 => Some(PoolStatus::Migrating),
            4 => Some(PoolStatus::Migrated),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolStatus::NotInitialized => "NotInitialized",
            PoolStatus::Initializing => "Initializing",
            PoolStatus::Active => "Active",
            PoolStatus::Migrating => "Migrating",
            PoolStatus::Migrated => "Migrated",
        }
    }
}

impl std::fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical pool configuration tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    /// `uint24` on chain.
    pub fee: u32,
    /// `int24` on chain.
    pub tick_spacing: i32,
    pub hooks: Address,
}

/// 32-byte pool identifier derived from a [`PoolKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub [u8; 32]);

impl PoolId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, String> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(body).map_err(|e| format!("invalid pool id {}: {}", s, e))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| format!("pool id must be 32 bytes: {}", s))?;
        Ok(PoolId(arr))
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PoolId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PoolId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PoolId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Pool state for one entity as reported by the pool initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub status: PoolStatus,
    pub key: PoolKey,
    pub pool_id: PoolId,
    pub numeraire: Address,
    pub far_tick: i32,
}

impl PoolState {
    /// Only active pools accrue claimable fees.
    pub fn is_claimable(&self) -> bool {
        self.status == PoolStatus::Active
    }
}

/// Outcome of reading pool state for one entity during collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PoolReading {
    Found(PoolState),
    NotFound { reason: String },
}

impl PoolReading {
    pub fn state(&self) -> Option<&PoolState> {
        match self {
            PoolReading::Found(state) => Some(state),
            PoolReading::NotFound { .. } => None,
        }
    }

    /// Status label used for change detection; "unavailable" when not found.
    pub fn status_label(&self) -> &'static str {
        match self {
            PoolReading::Found(state) => state.status.as_str(),
            PoolReading::NotFound { .. } => "unavailable",
        }
    }

    pub fn is_active(&self) -> bool {
        self.state().map(|s| s.is_claimable()).unwrap_or(false)
    }
}
