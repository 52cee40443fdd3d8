//! Point-in-time ledger snapshots.
//!
//! The storage engine is someone else's problem; this only defines the
//! serialized shape (JSON) and the round trip back into a [`Ledger`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pointsledger_core::{Address, AggregateRoot, LedgerId};
use pointsledger_ledger::{Ledger, MintPolicy};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot total supply mismatch: recorded {recorded}, computed {computed}")]
    SupplyMismatch { recorded: u128, computed: u128 },
}

/// Serialized ledger state.
///
/// `version` doubles as the last journal sequence number, so a service
/// restored from a snapshot keeps numbering events where it left off.
/// Balances are kept in a `BTreeMap` so the encoding is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub ledger_id: LedgerId,
    pub version: u64,
    pub policy: MintPolicy,
    /// Stored as a decimal string: JSON numbers cannot carry a full `u128`.
    #[serde(with = "u128_string")]
    pub total_supply: u128,
    pub balances: BTreeMap<Address, u64>,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &Ledger) -> Self {
        Self {
            ledger_id: ledger.id_typed(),
            version: ledger.version(),
            policy: ledger.policy().clone(),
            total_supply: ledger.total_supply(),
            balances: ledger.accounts().collect(),
        }
    }

    pub fn into_ledger(self) -> Ledger {
        Ledger::from_parts(self.ledger_id, self.policy, self.version, self.balances)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a snapshot and check that its recorded supply matches its balances.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(raw)?;
        let computed: u128 = snapshot.balances.values().map(|b| u128::from(*b)).sum();
        if computed != snapshot.total_supply {
            return Err(SnapshotError::SupplyMismatch {
                recorded: snapshot.total_supply,
                computed,
            });
        }
        Ok(snapshot)
    }
}

mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
