use crate::{Event, EventEnvelope};

/// A projection builds a read model from an append-only event stream.
///
/// Read models are **disposable**: they can be dropped and rebuilt from the
/// journal at any time. Off-system accounting reconciliation is the main
/// consumer; a projection rebuilt from the full stream must agree with the
/// ledger it was fed from.
///
/// ## Idempotency
///
/// Delivery is at-least-once, so applying the same envelope twice must leave
/// the read model unchanged. [`ProjectionRunner`](crate::ProjectionRunner)
/// rejects out-of-order sequence numbers, but projections should still be
/// idempotent on their own.
///
/// ## Error Handling
///
/// `apply` does not return errors. Events a projection does not care about
/// are ignored; structural problems (wrong stream, ordering) are caught by
/// the runner before `apply` is called.
pub trait Projection {
    type Ev: Event;

    /// Apply a single event to the projection, updating the read model.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>);
}
