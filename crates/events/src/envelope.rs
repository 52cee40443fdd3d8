use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pointsledger_core::LedgerId;

/// Envelope for an event, carrying stream metadata.
///
/// This is the unit appended to a ledger's journal and published on the bus.
///
/// Notes:
/// - **Append-only**: `sequence_number` is monotonically increasing per ledger,
///   starting at 1.
/// - `payload` is the typed domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    ledger_id: LedgerId,

    /// Monotonically increasing position in the ledger stream.
    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, ledger_id: LedgerId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            ledger_id,
            sequence_number,
            payload,
        }
    }

    pub fn ledger_id(&self) -> LedgerId {
        self.ledger_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
