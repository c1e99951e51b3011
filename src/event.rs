//! Fully reassembled events handed to consumers.
//!
//! An [`Event`] is immutable after construction and intentionally not
//! `Clone`: it moves from the assembler into the queue and from the queue to
//! exactly one consumer.

use std::time::Instant;

use bytes::{Bytes, BytesMut};

use crate::fragment::EventId;

/// Container for a complete event's payloads, ordered by fragment index.
#[derive(Debug, PartialEq, Eq)]
pub struct Event {
    event_id: EventId,
    payloads: Vec<Bytes>,
    completed_at: Instant,
}

impl Event {
    /// Construct a new [`Event`] from payloads already ordered by index.
    #[must_use]
    pub(crate) fn new(event_id: EventId, payloads: Vec<Bytes>, completed_at: Instant) -> Self {
        Self {
            event_id,
            payloads,
            completed_at,
        }
    }

    /// Identifier shared by the fragments that formed this event.
    #[must_use]
    pub const fn event_id(&self) -> EventId { self.event_id }

    /// Borrow the payloads in fragment-index order.
    #[must_use]
    pub fn payloads(&self) -> &[Bytes] { self.payloads.as_slice() }

    /// Number of fragments the event was assembled from.
    #[must_use]
    pub fn fragment_count(&self) -> usize { self.payloads.len() }

    /// Total number of payload bytes across all fragments.
    #[must_use]
    pub fn payload_len(&self) -> usize { self.payloads.iter().map(Bytes::len).sum() }

    /// Moment the final fragment arrived and the event was assembled.
    #[must_use]
    pub const fn completed_at(&self) -> Instant { self.completed_at }

    /// Copy the payload sequence into one contiguous buffer.
    #[must_use]
    pub fn concat(&self) -> Bytes {
        let mut joined = BytesMut::with_capacity(self.payload_len());
        for payload in &self.payloads {
            joined.extend_from_slice(payload);
        }
        joined.freeze()
    }

    /// Consume the event, returning the owned payload sequence.
    #[must_use]
    pub fn into_payloads(self) -> Vec<Bytes> { self.payloads }
}
