use uuid::Uuid;

use pointsledger_core::LedgerId;
use pointsledger_events::EventEnvelope;
use pointsledger_ledger::LedgerEvent;

/// In-memory append-only journal of committed ledger events.
///
/// Source of truth for consumers that missed bus deliveries. Sequence
/// numbers are assigned here, contiguous and starting right after
/// `base_sequence` (0 for a fresh ledger).
#[derive(Debug, Clone)]
pub struct EventJournal {
    ledger_id: LedgerId,
    base_sequence: u64,
    entries: Vec<EventEnvelope<LedgerEvent>>,
}

impl EventJournal {
    pub fn new(ledger_id: LedgerId) -> Self {
        Self::starting_after(ledger_id, 0)
    }

    /// Journal for a ledger restored at `base_sequence`; the next append gets
    /// `base_sequence + 1`.
    pub fn starting_after(ledger_id: LedgerId, base_sequence: u64) -> Self {
        Self {
            ledger_id,
            base_sequence,
            entries: Vec::new(),
        }
    }

    pub fn last_sequence_number(&self) -> u64 {
        self.entries
            .last()
            .map(|e| e.sequence_number())
            .unwrap_or(self.base_sequence)
    }

    /// Append a committed event and return its envelope.
    pub fn append(&mut self, event: LedgerEvent) -> EventEnvelope<LedgerEvent> {
        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            self.ledger_id,
            self.last_sequence_number() + 1,
            event,
        );
        self.entries.push(envelope.clone());
        envelope
    }

    /// Envelopes with a sequence number strictly greater than `after`.
    pub fn events_since(&self, after: u64) -> Vec<EventEnvelope<LedgerEvent>> {
        // Contiguous numbering lets us index instead of scanning.
        let skip = after.saturating_sub(self.base_sequence);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Drop every entry with a sequence number at or below `through`.
    ///
    /// Numbering is unaffected: the next append still follows the last
    /// sequence number. Returns how many entries were dropped. Consumers
    /// behind `through` must resync from a snapshot.
    pub fn truncate_through(&mut self, through: u64) -> usize {
        let through = through.min(self.last_sequence_number());
        if through <= self.base_sequence {
            return 0;
        }
        let dropped = usize::try_from(through - self.base_sequence).unwrap_or(usize::MAX);
        let dropped = dropped.min(self.entries.len());
        self.entries.drain(..dropped);
        self.base_sequence = through;
        dropped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
