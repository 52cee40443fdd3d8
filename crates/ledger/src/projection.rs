//! Balance read model rebuilt purely from ledger events.
//!
//! This is what an off-system reconciler keeps: it never sees commands, only
//! published events, and must end up agreeing with the ledger.

use std::collections::HashMap;

use pointsledger_core::Address;
use pointsledger_events::{EventEnvelope, Projection};

use crate::ledger::LedgerEvent;

/// Per-address balances plus running counters, derived from events.
///
/// Envelopes at or below the last applied sequence number are ignored, so
/// redelivery leaves balances and counters untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceProjection {
    balances: HashMap<Address, u64>,
    credited: u128,
    debited: u128,
    events_seen: u64,
    last_sequence_number: u64,
}

impl BalanceProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, user: &Address) -> u64 {
        self.balances.get(user).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.balances.values().map(|b| u128::from(*b)).sum()
    }

    /// Total ever credited minus total ever debited, from event amounts.
    ///
    /// Equals `total_supply()` whenever the stream was applied exactly once.
    pub fn net_issued(&self) -> u128 {
        self.credited.saturating_sub(self.debited)
    }

    /// Distinct events applied (duplicates excluded).
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    pub fn last_sequence_number(&self) -> u64 {
        self.last_sequence_number
    }

    pub fn accounts(&self) -> impl Iterator<Item = (Address, u64)> + '_ {
        self.balances.iter().map(|(addr, bal)| (*addr, *bal))
    }
}

impl Projection for BalanceProjection {
    type Ev = LedgerEvent;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>) {
        if envelope.sequence_number() <= self.last_sequence_number {
            return;
        }

        match envelope.payload() {
            LedgerEvent::Credited(e) => {
                self.balances.insert(e.user, e.new_balance);
                self.credited += u128::from(e.amount);
            }
            LedgerEvent::Debited(e) => {
                self.balances.insert(e.user, e.new_balance);
                self.debited += u128::from(e.amount);
            }
            LedgerEvent::Transferred(e) => {
                self.balances.insert(e.from, e.from_balance);
                self.balances.insert(e.to, e.to_balance);
            }
        }
        self.events_seen += 1;
        self.last_sequence_number = envelope.sequence_number();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExecutionContext, Ledger};
    use pointsledger_core::LedgerId;
    use pointsledger_events::ProjectionRunner;
    use uuid::Uuid;

    #[test]
    fn projection_reconciles_with_ledger() {
        let alice = Address::from_low_u64(1);
        let bob = Address::from_low_u64(2);
        let ledger_id = LedgerId::new();
        let mut ledger = Ledger::empty(ledger_id);

        let events = vec![
            LedgerEvent::Credited(ledger.credit(ExecutionContext::now(alice), alice, 100).unwrap()),
            LedgerEvent::Transferred(ledger.transfer(ExecutionContext::now(alice), bob, 40).unwrap()),
            LedgerEvent::Debited(ledger.debit(ExecutionContext::now(bob), 15).unwrap()),
        ];
        let envelopes: Vec<_> = events
            .into_iter()
            .enumerate()
            .map(|(i, ev)| EventEnvelope::new(Uuid::now_v7(), ledger_id, i as u64 + 1, ev))
            .collect();

        let (projection, cursor) =
            ProjectionRunner::rebuild_from_scratch(BalanceProjection::new, &envelopes).unwrap();

        assert_eq!(cursor.unwrap().last_sequence_number(), 3);
        assert_eq!(projection.balance_of(&alice), ledger.balance_of(&alice));
        assert_eq!(projection.balance_of(&bob), ledger.balance_of(&bob));
        assert_eq!(projection.total_supply(), ledger.total_supply());
        assert_eq!(projection.net_issued(), 85);
    }

    #[test]
    fn duplicate_delivery_leaves_projection_unchanged() {
        let alice = Address::from_low_u64(1);
        let mut ledger = Ledger::empty(LedgerId::new());
        let ev = ledger.credit(ExecutionContext::now(alice), alice, 10).unwrap();
        let envelope =
            EventEnvelope::new(Uuid::now_v7(), ledger.id_typed(), 1, LedgerEvent::Credited(ev));

        let mut projection = BalanceProjection::new();
        projection.apply(&envelope);
        let once = projection.clone();
        projection.apply(&envelope);

        assert_eq!(projection, once);
        assert_eq!(projection.balance_of(&alice), 10);
        assert_eq!(projection.total_supply(), 10);
        assert_eq!(projection.net_issued(), projection.total_supply());
        assert_eq!(projection.events_seen(), 1);
    }

    #[test]
    fn stale_redelivery_after_newer_events_is_ignored() {
        let alice = Address::from_low_u64(1);
        let ledger_id = LedgerId::new();
        let mut ledger = Ledger::empty(ledger_id);
        let first = LedgerEvent::Credited(
            ledger.credit(ExecutionContext::now(alice), alice, 10).unwrap(),
        );
        let second = LedgerEvent::Debited(ledger.debit(ExecutionContext::now(alice), 4).unwrap());
        let first = EventEnvelope::new(Uuid::now_v7(), ledger_id, 1, first);
        let second = EventEnvelope::new(Uuid::now_v7(), ledger_id, 2, second);

        let mut projection = BalanceProjection::new();
        projection.apply(&first);
        projection.apply(&second);
        projection.apply(&first);

        assert_eq!(projection.balance_of(&alice), 6);
        assert_eq!(projection.net_issued(), 6);
        assert_eq!(projection.last_sequence_number(), 2);
    }
}
