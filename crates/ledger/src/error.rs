//! Ledger failure taxonomy.
//!
//! Every failure is reported synchronously and aborts the whole operation:
//! no clamping, no partial writes, no event.

use thiserror::Error;

use pointsledger_core::Address;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A debit or transfer asked for more than the source account holds.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    /// Transfer target equals the caller.
    #[error("self-transfer not allowed")]
    SelfTransferNotAllowed,

    /// Adding `amount` to `current` would exceed the balance ceiling.
    #[error("balance overflow: current {current}, amount {amount}")]
    Overflow { current: u64, amount: u64 },

    /// The mint policy does not allow this caller to credit accounts.
    #[error("caller {0} is not allowed to credit accounts")]
    MintNotAuthorized(Address),
}
