//! Tracked entities (tokens) as supplied by the registry.

use crate::domain::{Address, TimeMs};
use serde::{Deserialize, Serialize};

/// Token category. Products are priced against a builder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Builder,
    Product,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Builder => "builder",
            Category::Product => "product",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "builder" => Ok(Category::Builder),
            "product" => Ok(Category::Product),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable registry record for one tracked token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntity {
    /// Unique key.
    pub symbol: String,
    pub name: String,
    pub category: Category,
    /// Token contract address.
    pub address: Address,
    /// Builder token this entity is priced against, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeraire: Option<Address>,
    pub created_at: TimeMs,
}

impl TrackedEntity {
    pub fn is_builder(&self) -> bool {
        self.category == Category::Builder
    }
}
