use chrono::{DateTime, Utc};

use pointsledger_core::Address;

/// Per-call context supplied by the hosting environment.
///
/// The caller identity comes from an authenticated execution context, never
/// from the operation's argument list. Operations that act on "my own"
/// balance (`debit`, the source side of `transfer`) read it from here.
///
/// There are no serde impls: a context is built by the host, never decoded
/// from input.
///
/// ```compile_fail
/// fn decodable<T: serde::de::DeserializeOwned>() {}
/// decodable::<pointsledger_ledger::ExecutionContext>();
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    caller: Address,
    occurred_at: DateTime<Utc>,
}

impl ExecutionContext {
    pub fn new(caller: Address, occurred_at: DateTime<Utc>) -> Self {
        Self {
            caller,
            occurred_at,
        }
    }

    /// Context stamped with the current wall-clock time.
    pub fn now(caller: Address) -> Self {
        Self::new(caller, Utc::now())
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}
