//! Loading tracked entities from token record files.
//!
//! The launch tooling writes one JSON file per token (`<symbol>.json`). This
//! loader turns a directory of those files into validated registry records.

use crate::domain::{Address, Category, TimeMs, TrackedEntity};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid token record {path}: {detail}")]
    Invalid { path: PathBuf, detail: String },
    #[error("duplicate symbol {symbol} in {path}")]
    DuplicateSymbol { symbol: String, path: PathBuf },
}

/// On-disk token record. Unknown fields (description, image, ...) are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenFile {
    name: String,
    symbol: String,
    #[serde(default = "default_category")]
    category: String,
    address: String,
    #[serde(default)]
    builder_coin: Option<String>,
    #[serde(default)]
    chain_id: Option<u64>,
    #[serde(default)]
    launched_at: Option<String>,
}

fn default_category() -> String {
    "builder".to_string()
}

/// Parse one token record. `chain_id` is the chain the engine is bound to.
pub fn parse_token_record(
    path: &Path,
    content: &str,
    chain_id: u64,
) -> Result<TrackedEntity, RegistryError> {
    let invalid = |detail: String| RegistryError::Invalid {
        path: path.to_path_buf(),
        detail,
    };

    let file: TokenFile = serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?;

    if file.symbol.trim().is_empty() {
        return Err(invalid("empty symbol".to_string()));
    }
    if let Some(id) = file.chain_id {
        if id != chain_id {
            return Err(invalid(format!(
                "token is on chain {}, engine is bound to chain {}",
                id, chain_id
            )));
        }
    }

    let category = file.category.parse::<Category>().map_err(invalid)?;
    let address = Address::parse(&file.address).map_err(|e| invalid(e.to_string()))?;
    let numeraire = file
        .builder_coin
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(Address::parse)
        .transpose()
        .map_err(|e| invalid(e.to_string()))?;

    if category == Category::Product && numeraire.is_none() {
        return Err(invalid(format!(
            "product {} has no builderCoin",
            file.symbol
        )));
    }

    let created_at = match file.launched_at.as_deref() {
        Some(ts) => chrono::DateTime::parse_from_rfc3339(ts)
            .map(|dt| TimeMs::new(dt.timestamp_millis()))
            .map_err(|e| invalid(format!("launchedAt {}: {}", ts, e)))?,
        None => TimeMs::new(0),
    };

    Ok(TrackedEntity {
        symbol: file.symbol.trim().to_string(),
        name: file.name,
        category,
        address,
        numeraire,
        created_at,
    })
}

/// Load every `*.json` record in `dir`, sorted by symbol.
///
/// A missing directory is an empty registry.
pub fn load_registry_dir(dir: &Path, chain_id: u64) -> Result<Vec<TrackedEntity>, RegistryError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let io_err = |path: &Path, source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    paths.sort();

    let mut seen = HashSet::new();
    let mut entities = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let entity = parse_token_record(&path, &content, chain_id)?;
        if !seen.insert(entity.symbol.clone()) {
            return Err(RegistryError::DuplicateSymbol {
                symbol: entity.symbol,
                path,
            });
        }
        debug!(symbol = %entity.symbol, path = %path.display(), "loaded token record");
        entities.push(entity);
    }

    entities.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(entities)
}
