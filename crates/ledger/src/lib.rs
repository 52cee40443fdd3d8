//! Points ledger (per-user balances, event-sourced).
//!
//! Pure domain logic only: no IO, no locking, no persistence concerns.
//! Hosting (serialization of calls, journaling, publication) lives in
//! `pointsledger-infra`.

pub mod context;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod projection;

pub use context::ExecutionContext;
pub use error::LedgerError;
pub use ledger::{
    CreditPoints, Credited, DebitPoints, Debited, Ledger, LedgerCommand, LedgerEvent,
    MAX_BALANCE, TransferPoints, Transferred,
};
pub use policy::MintPolicy;
pub use projection::BalanceProjection;
