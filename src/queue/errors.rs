//! Error types for event queue operations and configuration.

use thiserror::Error;

use super::MAX_QUEUE_CAPACITY;
use crate::fragment::EventId;

/// Errors that can occur when pushing an event.
///
/// The rejected event is dropped; callers count and report the loss.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PushError {
    /// The queue was at capacity and the push was not allowed to wait.
    #[error("event queue full; event {event_id} dropped")]
    QueueFull { event_id: EventId },
    /// The queue was closed before the event could be enqueued.
    #[error("event queue closed; event {event_id} dropped")]
    Closed { event_id: EventId },
}

impl PushError {
    /// Identifier of the event that was not enqueued.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        match self {
            Self::QueueFull { event_id } | Self::Closed { event_id } => *event_id,
        }
    }
}

/// Errors returned when building an event queue.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueConfigError {
    /// The capacity was zero or exceeded [`MAX_QUEUE_CAPACITY`].
    #[error("invalid capacity {0}; must be between 1 and {max}", max = MAX_QUEUE_CAPACITY)]
    InvalidCapacity(usize),
}
