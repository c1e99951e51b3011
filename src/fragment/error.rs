//! Validation errors for individual fragments.
//!
//! A fragment that fails any of these checks is rejected at insert and never
//! reaches the buffer.

use thiserror::Error;

use super::{EventId, FragmentIndex};

/// Reasons a fragment is considered malformed.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    /// The header declares an event with no fragments.
    #[error("event {event_id}: fragment count must be at least one")]
    ZeroCount { event_id: EventId },
    /// The index does not address a slot below the declared count.
    #[error("event {event_id}: fragment index {index} out of range for count {count}")]
    IndexOutOfRange {
        event_id: EventId,
        index: FragmentIndex,
        count: u32,
    },
    /// The declared count disagrees with earlier fragments of the same event.
    #[error("event {event_id}: fragment count {found} disagrees with expected {expected}")]
    CountMismatch {
        event_id: EventId,
        expected: u32,
        found: u32,
    },
}
