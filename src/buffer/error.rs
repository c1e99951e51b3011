//! Error and report types emitted by the fragment buffer.

use thiserror::Error;

use crate::fragment::{EventId, FragmentError, FragmentIndex};

/// Reasons an inserted fragment was not accepted.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum InsertError {
    /// The fragment failed header validation and never entered the buffer.
    #[error("malformed fragment: {0}")]
    Malformed(#[from] FragmentError),
    /// The `(event_id, fragment_index)` pair was already received.
    #[error("duplicate fragment {fragment_index} for event {event_id}")]
    Duplicate {
        event_id: EventId,
        fragment_index: FragmentIndex,
    },
    /// The event was already discarded as stale; the straggler is refused so
    /// the event cannot restart.
    #[error("fragment {fragment_index} for event {event_id} arrived after the event was discarded")]
    Discarded {
        event_id: EventId,
        fragment_index: FragmentIndex,
    },
    /// The pipeline is shutting down and no longer accepts fragments.
    #[error("fragment for event {event_id} rejected: input closed")]
    Closed { event_id: EventId },
}

/// Report emitted when a partial event is dropped before completing.
///
/// Discards are not fatal. They are logged, counted, and returned to the
/// caller that triggered the sweep so hosts can surface them as a health
/// signal.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error(
    "incomplete event {event_id} discarded with {received_count} of {expected_count} fragments"
)]
pub struct IncompleteEventDiscarded {
    /// Identifier of the abandoned event.
    pub event_id: EventId,
    /// Fragments that had arrived.
    pub received_count: u32,
    /// Fragments the event declared.
    pub expected_count: u32,
}
