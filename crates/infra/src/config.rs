//! Configuration loading and representation.
//!
//! Read from the process environment:
//!
//! - `POINTS_MINT_POLICY`: `open` (default) or `restricted`
//! - `POINTS_MINTERS`: comma-separated addresses, required when restricted

use thiserror::Error;
use tracing::info;

use pointsledger_core::{Address, DomainError};
use pointsledger_ledger::MintPolicy;

pub const MINT_POLICY_VAR: &str = "POINTS_MINT_POLICY";
pub const MINTERS_VAR: &str = "POINTS_MINTERS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown mint policy '{0}' (expected 'open' or 'restricted')")]
    UnknownPolicy(String),

    #[error("restricted mint policy requires at least one address in POINTS_MINTERS")]
    MissingMinters,

    #[error("invalid minter address: {0}")]
    InvalidMinter(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerConfig {
    pub mint_policy: MintPolicy,
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = lookup(MINT_POLICY_VAR)
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "open".to_string());

        let mint_policy = match mode.as_str() {
            "open" => MintPolicy::Open,
            "restricted" => {
                let minters = lookup(MINTERS_VAR)
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<Address>)
                    .collect::<Result<Vec<_>, _>>()?;
                if minters.is_empty() {
                    return Err(ConfigError::MissingMinters);
                }
                MintPolicy::restricted(minters)
            }
            _ => return Err(ConfigError::UnknownPolicy(mode)),
        };

        match &mint_policy {
            MintPolicy::Open => info!("mint policy: open (any caller may credit any account)"),
            MintPolicy::Restricted { minters } => {
                info!(minters = minters.len(), "mint policy: restricted")
            }
        }

        Ok(Self { mint_policy })
    }
}
