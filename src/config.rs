use crate::domain::Address;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
pub const DEFAULT_CHAIN_ID: u64 = 8453;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub wallet_address: Address,
    pub pool_initializer: Address,
    pub history_retention: usize,
    pub rpc_timeout: Duration,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub max_concurrency: usize,
    pub registry_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let database_path = required(&env_map, "DATABASE_PATH")?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let chain_id = parse_or(&env_map, "CHAIN_ID", DEFAULT_CHAIN_ID, "must be a valid u64")?;

        let wallet_address = parse_address(&env_map, "WALLET_ADDRESS")?;
        let pool_initializer = parse_address(&env_map, "POOL_INITIALIZER_ADDRESS")?;

        let history_retention =
            parse_or(&env_map, "HISTORY_RETENTION", 50usize, "must be a valid usize")?;
        if history_retention == 0 {
            return Err(ConfigError::InvalidValue(
                "HISTORY_RETENTION".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let rpc_timeout = Duration::from_millis(parse_or(
            &env_map,
            "RPC_TIMEOUT_MS",
            10_000u64,
            "must be a valid u64",
        )?);
        let receipt_timeout = Duration::from_millis(parse_or(
            &env_map,
            "RECEIPT_TIMEOUT_MS",
            120_000u64,
            "must be a valid u64",
        )?);
        let receipt_poll_interval = Duration::from_millis(parse_or(
            &env_map,
            "RECEIPT_POLL_MS",
            2_000u64,
            "must be a valid u64",
        )?);

        let max_concurrency = parse_or(&env_map, "MAX_CONCURRENCY", 4usize, "must be a valid usize")?;
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let registry_dir = env_map
            .get("REGISTRY_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            port,
            database_path,
            rpc_url,
            chain_id,
            wallet_address,
            pool_initializer,
            history_retention,
            rpc_timeout,
            receipt_timeout,
            receipt_poll_interval,
            max_concurrency,
            registry_dir,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_address(env_map: &HashMap<String, String>, key: &str) -> Result<Address, ConfigError> {
    let raw = required(env_map, key)?;
    Address::parse(&raw).map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expectation: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expectation.to_string())),
        None => Ok(default),
    }
}
