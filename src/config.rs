//! Environment-driven configuration.
//!
//! | variable | default |
//! |---|---|
//! | `NOTARY_LEDGER` | `rpc` (or `sqlite`) |
//! | `NOTARY_PROVIDER_URL` | required for `rpc` |
//! | `NOTARY_CONTRACT_ADDRESS` | `0x5FbDB2315678afecb367f032d93F642f64180aa3` |
//! | `NOTARY_ACCOUNT` | zero address |
//! | `NOTARY_DB_PATH` | `/var/lib/notary/notary.db` |
//! | `NOTARY_CONFIRMATION_POLL_MS` | `500` |
//! | `NOTARY_CONFIRMATION_MAX_POLLS` | `120` |
//! | `PINATA_JWT` | required |
//! | `PINATA_GATEWAY` | required |
//! | `PINATA_UPLOAD_URL` | Pinata v3 upload endpoint |

use crate::infrastructure::gateway::DEFAULT_UPLOAD_URL;
use crate::infrastructure::RpcSettings;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEFAULT_ACCOUNT: &str = "0x0000000000000000000000000000000000000000";
pub const DEFAULT_DB_PATH: &str = "/var/lib/notary/notary.db";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerBackend {
    Rpc,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    /// Empty when no provider is configured; the rpc backend then refuses
    /// to start with `ProviderUnavailable`.
    pub provider_url: String,
    pub contract_address: String,
    pub account: String,
    pub db_path: String,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl LedgerConfig {
    pub fn rpc_settings(&self) -> RpcSettings {
        RpcSettings {
            provider_url: self.provider_url.clone(),
            contract_address: self.contract_address.clone(),
            account: self.account.clone(),
            poll_interval: self.poll_interval,
            max_polls: self.max_polls,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub jwt: String,
    pub gateway: String,
    pub upload_url: String,
}

#[derive(Debug, Clone)]
pub struct NotaryConfig {
    pub ledger: LedgerConfig,
    pinata_jwt: Option<String>,
    pinata_gateway: Option<String>,
    pinata_upload_url: String,
}

impl NotaryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let backend = match get("NOTARY_LEDGER").as_deref() {
            None | Some("rpc") => LedgerBackend::Rpc,
            Some("sqlite") => LedgerBackend::Sqlite,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "NOTARY_LEDGER",
                    value: other.to_string(),
                })
            }
        };

        let poll_ms = parse_number(
            get("NOTARY_CONFIRMATION_POLL_MS"),
            "NOTARY_CONFIRMATION_POLL_MS",
            500,
        )?;
        let max_polls = parse_number(
            get("NOTARY_CONFIRMATION_MAX_POLLS"),
            "NOTARY_CONFIRMATION_MAX_POLLS",
            120,
        )?;

        let ledger = LedgerConfig {
            backend,
            provider_url: get("NOTARY_PROVIDER_URL").unwrap_or_default(),
            contract_address: get("NOTARY_CONTRACT_ADDRESS")
                .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string()),
            account: get("NOTARY_ACCOUNT").unwrap_or_else(|| DEFAULT_ACCOUNT.to_string()),
            db_path: get("NOTARY_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            poll_interval: Duration::from_millis(poll_ms),
            max_polls: max_polls as u32,
        };

        Ok(Self {
            ledger,
            pinata_jwt: get("PINATA_JWT"),
            pinata_gateway: get("PINATA_GATEWAY"),
            pinata_upload_url: get("PINATA_UPLOAD_URL")
                .unwrap_or_else(|| DEFAULT_UPLOAD_URL.to_string()),
        })
    }

    /// Gateway credentials. Only uploads need them; verification runs
    /// without.
    pub fn gateway(&self) -> Result<GatewayConfig, ConfigError> {
        Ok(GatewayConfig {
            jwt: self
                .pinata_jwt
                .clone()
                .ok_or(ConfigError::Missing("PINATA_JWT"))?,
            gateway: self
                .pinata_gateway
                .clone()
                .ok_or(ConfigError::Missing("PINATA_GATEWAY"))?,
            upload_url: self.pinata_upload_url.clone(),
        })
    }
}

fn parse_number(raw: Option<String>, name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0 && *n <= u32::MAX as u64)
            .ok_or(ConfigError::Invalid { name, value }),
    }
}
