use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pointsledger_core::{Address, Aggregate, AggregateRoot, LedgerId};
use pointsledger_events::Event;

use crate::context::ExecutionContext;
use crate::error::LedgerError;
use crate::policy::MintPolicy;

/// Ceiling of a single balance. Any addition past it fails with `Overflow`.
pub const MAX_BALANCE: u64 = u64::MAX;

/// Command: credit `amount` points to `user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditPoints {
    pub context: ExecutionContext,
    pub user: Address,
    pub amount: u64,
}

/// Command: debit `amount` points from the caller's own balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebitPoints {
    pub context: ExecutionContext,
    pub amount: u64,
}

/// Command: move `amount` points from the caller to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPoints {
    pub context: ExecutionContext,
    pub recipient: Address,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    Credit(CreditPoints),
    Debit(DebitPoints),
    Transfer(TransferPoints),
}

/// Event: points were credited to `user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credited {
    pub user: Address,
    pub amount: u64,
    pub new_balance: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: points were debited from `user` (always the caller).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debited {
    pub user: Address,
    pub amount: u64,
    pub new_balance: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: points moved from `from` to `to`. Carries both post-transfer balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transferred {
    pub from: Address,
    pub to: Address,
    pub amount: u64,
    pub from_balance: u64,
    pub to_balance: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    Credited(Credited),
    Debited(Debited),
    Transferred(Transferred),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::Credited(_) => "points.ledger.credited",
            LedgerEvent::Debited(_) => "points.ledger.debited",
            LedgerEvent::Transferred(_) => "points.ledger.transferred",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::Credited(e) => e.occurred_at,
            LedgerEvent::Debited(e) => e.occurred_at,
            LedgerEvent::Transferred(e) => e.occurred_at,
        }
    }
}

/// Aggregate root: the points ledger.
///
/// Owns the `Address -> balance` mapping. An address absent from the map has
/// a balance of zero; entries appear on the first successful write and are
/// never removed.
///
/// Every mutation goes through `handle` (checks and arithmetic, no mutation)
/// and then `apply` (writes the post-operation balances carried by the
/// event). A rejected command therefore leaves the ledger untouched.
///
/// The ledger itself does no locking. Callers must serialize mutating calls,
/// either through a host that runs one invocation at a time or through
/// `pointsledger-infra::LedgerService`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    id: LedgerId,
    balances: HashMap<Address, u64>,
    policy: MintPolicy,
    version: u64,
}

impl Ledger {
    /// Empty ledger with the open mint policy.
    pub fn empty(id: LedgerId) -> Self {
        Self::with_policy(id, MintPolicy::Open)
    }

    pub fn with_policy(id: LedgerId, policy: MintPolicy) -> Self {
        Self {
            id,
            balances: HashMap::new(),
            policy,
            version: 0,
        }
    }

    /// Reassemble a ledger from previously captured state (e.g. a snapshot).
    pub fn from_parts(
        id: LedgerId,
        policy: MintPolicy,
        version: u64,
        balances: impl IntoIterator<Item = (Address, u64)>,
    ) -> Self {
        Self {
            id,
            balances: balances.into_iter().collect(),
            policy,
            version,
        }
    }

    pub fn id_typed(&self) -> LedgerId {
        self.id
    }

    pub fn policy(&self) -> &MintPolicy {
        &self.policy
    }

    /// Balance of `user`; zero if the account was never written.
    pub fn balance_of(&self, user: &Address) -> u64 {
        self.balances.get(user).copied().unwrap_or(0)
    }

    /// Sum of all balances. Wider than a single balance so it cannot overflow.
    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| u128::from(*b)).sum()
    }

    /// Number of materialized accounts (including ones drained to zero).
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.balances.iter().map(|(addr, bal)| (*addr, *bal))
    }

    /// Credit `amount` to `user` and return the applied event.
    pub fn credit(
        &mut self,
        context: ExecutionContext,
        user: Address,
        amount: u64,
    ) -> Result<Credited, LedgerError> {
        let event = self.decide_credit(&CreditPoints {
            context,
            user,
            amount,
        })?;
        self.apply(&LedgerEvent::Credited(event.clone()));
        Ok(event)
    }

    /// Debit `amount` from the caller's balance and return the applied event.
    pub fn debit(
        &mut self,
        context: ExecutionContext,
        amount: u64,
    ) -> Result<Debited, LedgerError> {
        let event = self.decide_debit(&DebitPoints { context, amount })?;
        self.apply(&LedgerEvent::Debited(event.clone()));
        Ok(event)
    }

    /// Move `amount` from the caller to `recipient` and return the applied event.
    pub fn transfer(
        &mut self,
        context: ExecutionContext,
        recipient: Address,
        amount: u64,
    ) -> Result<Transferred, LedgerError> {
        let event = self.decide_transfer(&TransferPoints {
            context,
            recipient,
            amount,
        })?;
        self.apply(&LedgerEvent::Transferred(event.clone()));
        Ok(event)
    }

    /// Decide and apply an arbitrary command.
    pub fn execute(&mut self, command: &LedgerCommand) -> Result<LedgerEvent, LedgerError> {
        let event = self.decide(command)?;
        self.apply(&event);
        Ok(event)
    }

    fn decide(&self, command: &LedgerCommand) -> Result<LedgerEvent, LedgerError> {
        match command {
            LedgerCommand::Credit(cmd) => self.decide_credit(cmd).map(LedgerEvent::Credited),
            LedgerCommand::Debit(cmd) => self.decide_debit(cmd).map(LedgerEvent::Debited),
            LedgerCommand::Transfer(cmd) => {
                self.decide_transfer(cmd).map(LedgerEvent::Transferred)
            }
        }
    }

    fn decide_credit(&self, cmd: &CreditPoints) -> Result<Credited, LedgerError> {
        let caller = cmd.context.caller();
        if !self.policy.allows(&caller) {
            return Err(LedgerError::MintNotAuthorized(caller));
        }

        let current = self.balance_of(&cmd.user);
        let new_balance = current
            .checked_add(cmd.amount)
            .ok_or(LedgerError::Overflow {
                current,
                amount: cmd.amount,
            })?;

        Ok(Credited {
            user: cmd.user,
            amount: cmd.amount,
            new_balance,
            occurred_at: cmd.context.occurred_at(),
        })
    }

    fn decide_debit(&self, cmd: &DebitPoints) -> Result<Debited, LedgerError> {
        let caller = cmd.context.caller();
        let available = self.balance_of(&caller);

        // No partial debit.
        let new_balance =
            available
                .checked_sub(cmd.amount)
                .ok_or(LedgerError::InsufficientBalance {
                    available,
                    requested: cmd.amount,
                })?;

        Ok(Debited {
            user: caller,
            amount: cmd.amount,
            new_balance,
            occurred_at: cmd.context.occurred_at(),
        })
    }

    fn decide_transfer(&self, cmd: &TransferPoints) -> Result<Transferred, LedgerError> {
        let from = cmd.context.caller();
        let to = cmd.recipient;

        // Checked before any balance is read.
        if from == to {
            return Err(LedgerError::SelfTransferNotAllowed);
        }

        let from_current = self.balance_of(&from);
        let to_current = self.balance_of(&to);

        let from_balance =
            from_current
                .checked_sub(cmd.amount)
                .ok_or(LedgerError::InsufficientBalance {
                    available: from_current,
                    requested: cmd.amount,
                })?;

        // The recipient can still overflow even though the sender cannot underflow.
        let to_balance = to_current
            .checked_add(cmd.amount)
            .ok_or(LedgerError::Overflow {
                current: to_current,
                amount: cmd.amount,
            })?;

        Ok(Transferred {
            from,
            to,
            amount: cmd.amount,
            from_balance,
            to_balance,
            occurred_at: cmd.context.occurred_at(),
        })
    }
}

impl AggregateRoot for Ledger {
    type Id = LedgerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for Ledger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = LedgerError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::Credited(e) => {
                self.balances.insert(e.user, e.new_balance);
            }
            LedgerEvent::Debited(e) => {
                self.balances.insert(e.user, e.new_balance);
            }
            LedgerEvent::Transferred(e) => {
                self.balances.insert(e.from, e.from_balance);
                self.balances.insert(e.to, e.to_balance);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.decide(command).map(|event| vec![event])
    }
}
