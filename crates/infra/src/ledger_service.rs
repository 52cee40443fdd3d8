//! Ledger hosting: one owned ledger behind one exclusion lock.
//!
//! The ledger's invariants assume each mutating call runs to completion
//! before the next one starts. A transactional host gives that for free;
//! this service provides it in an ordinary multi-threaded process.
//!
//! ## Mutation Flow
//!
//! ```text
//! call
//!   ↓
//! 1. Take the write lock (all operations, all accounts)
//!   ↓
//! 2. Decide + apply on the ledger (rejections stop here, nothing changed)
//!   ↓
//! 3. Append the event to the journal (assigns the sequence number)
//!   ↓
//! 4. Publish the envelope on the bus (still under the lock, so bus order
//!    matches journal order)
//! ```
//!
//! A publish failure does not undo a committed mutation and is not reported
//! as a failure of the call: the journal already holds the event, and
//! consumers catch up through [`LedgerService::events_since`].

use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use pointsledger_core::{Address, AggregateRoot, LedgerId};
use pointsledger_events::{Event, EventBus, EventEnvelope};
use pointsledger_ledger::{ExecutionContext, Ledger, LedgerCommand, LedgerError, LedgerEvent};

use crate::config::LedgerConfig;
use crate::journal::EventJournal;
use crate::snapshot::LedgerSnapshot;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The ledger rejected the operation; no state changed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A previous mutation panicked while holding the lock. Further writes
    /// are refused; reads keep working.
    #[error("ledger state lock poisoned")]
    Poisoned,
}

#[derive(Debug)]
struct ServiceState {
    ledger: Ledger,
    journal: EventJournal,
}

/// Thread-safe host for a single [`Ledger`].
///
/// ## Generic Parameters
///
/// - `B`: event bus receiving every committed envelope
#[derive(Debug)]
pub struct LedgerService<B> {
    ledger_id: LedgerId,
    state: RwLock<ServiceState>,
    bus: B,
}

impl<B> LedgerService<B>
where
    B: EventBus<EventEnvelope<LedgerEvent>>,
{
    /// Fresh, empty ledger configured from `config`.
    pub fn new(ledger_id: LedgerId, config: &LedgerConfig, bus: B) -> Self {
        Self::from_ledger(
            Ledger::with_policy(ledger_id, config.mint_policy.clone()),
            bus,
        )
    }

    /// Host an existing ledger. Journal numbering continues from its version.
    pub fn from_ledger(ledger: Ledger, bus: B) -> Self {
        let ledger_id = ledger.id_typed();
        let journal = EventJournal::starting_after(ledger_id, ledger.version());
        Self {
            ledger_id,
            state: RwLock::new(ServiceState { ledger, journal }),
            bus,
        }
    }

    /// Rebuild a service from a snapshot taken with [`LedgerService::snapshot`].
    pub fn restore(snapshot: LedgerSnapshot, bus: B) -> Self {
        Self::from_ledger(snapshot.into_ledger(), bus)
    }

    pub fn ledger_id(&self) -> LedgerId {
        self.ledger_id
    }

    /// Credit `amount` to `user`; returns the new balance.
    #[instrument(level = "debug", skip(self), fields(ledger_id = %self.ledger_id))]
    pub fn credit(
        &self,
        context: ExecutionContext,
        user: Address,
        amount: u64,
    ) -> Result<u64, ServiceError> {
        self.commit(
            |ledger| ledger.credit(context, user, amount),
            |ev| LedgerEvent::Credited(ev.clone()),
        )
        .map(|ev| ev.new_balance)
    }

    /// Debit `amount` from the caller; returns the caller's new balance.
    #[instrument(level = "debug", skip(self), fields(ledger_id = %self.ledger_id))]
    pub fn debit(&self, context: ExecutionContext, amount: u64) -> Result<u64, ServiceError> {
        self.commit(
            |ledger| ledger.debit(context, amount),
            |ev| LedgerEvent::Debited(ev.clone()),
        )
        .map(|ev| ev.new_balance)
    }

    /// Transfer `amount` from the caller to `recipient`; returns
    /// `(caller_new_balance, recipient_new_balance)`.
    #[instrument(level = "debug", skip(self), fields(ledger_id = %self.ledger_id))]
    pub fn transfer(
        &self,
        context: ExecutionContext,
        recipient: Address,
        amount: u64,
    ) -> Result<(u64, u64), ServiceError> {
        self.commit(
            |ledger| ledger.transfer(context, recipient, amount),
            |ev| LedgerEvent::Transferred(ev.clone()),
        )
        .map(|ev| (ev.from_balance, ev.to_balance))
    }

    /// Run a pre-built command and return its committed event.
    pub fn execute(&self, command: &LedgerCommand) -> Result<LedgerEvent, ServiceError> {
        self.commit(|ledger| ledger.execute(command), LedgerEvent::clone)
    }

    /// Balance of `user` (zero if never written). Never fails.
    pub fn get_balance(&self, user: &Address) -> u64 {
        self.read().ledger.balance_of(user)
    }

    pub fn total_supply(&self) -> u128 {
        self.read().ledger.total_supply()
    }

    pub fn account_count(&self) -> usize {
        self.read().ledger.account_count()
    }

    /// Number of events applied to the hosted ledger.
    pub fn version(&self) -> u64 {
        self.read().ledger.version()
    }

    /// Journaled envelopes with a sequence number greater than `after`.
    pub fn events_since(&self, after: u64) -> Vec<EventEnvelope<LedgerEvent>> {
        self.read().journal.events_since(after)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::capture(&self.read().ledger)
    }

    /// Capture a snapshot and drop every journal entry it covers.
    ///
    /// A long-running host calls this periodically to bound journal memory.
    /// Consumers behind the snapshot's version resync from the snapshot.
    pub fn snapshot_and_compact(&self) -> Result<LedgerSnapshot, ServiceError> {
        let mut state = self.state.write().map_err(|_| ServiceError::Poisoned)?;
        let snapshot = LedgerSnapshot::capture(&state.ledger);
        let dropped = state.journal.truncate_through(snapshot.version);
        debug!(
            ledger_id = %self.ledger_id,
            through = snapshot.version,
            dropped,
            "journal compacted"
        );
        Ok(snapshot)
    }

    // Reads stay available after a poisoning panic: mutations are applied
    // only after a successful decision, so the ledger is never half-written
    // by a rejected call.
    fn read(&self) -> RwLockReadGuard<'_, ServiceState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit<T>(
        &self,
        run: impl FnOnce(&mut Ledger) -> Result<T, LedgerError>,
        to_event: impl FnOnce(&T) -> LedgerEvent,
    ) -> Result<T, ServiceError> {
        let mut state = self.state.write().map_err(|_| ServiceError::Poisoned)?;

        let outcome = match run(&mut state.ledger) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(ledger_id = %self.ledger_id, error = %err, "ledger operation rejected");
                return Err(err.into());
            }
        };

        let envelope = state.journal.append(to_event(&outcome));
        debug!(
            ledger_id = %self.ledger_id,
            event_type = envelope.payload().event_type(),
            sequence_number = envelope.sequence_number(),
            "ledger event committed"
        );

        if let Err(err) = self.bus.publish(envelope) {
            warn!(
                ledger_id = %self.ledger_id,
                error = ?err,
                "event publication failed; consumers must catch up from the journal"
            );
        }

        Ok(outcome)
    }
}
