//! Fixed-capacity FIFO of completed events.
//!
//! [`BoundedEventQueue`] sits between the assembler and the consumers.
//! Events leave in the order they were enqueued, which is completion order
//! rather than event-id order. A full queue either suspends the pushing
//! producer ([`OverflowPolicy::Block`]) or rejects the event
//! ([`OverflowPolicy::Drop`]). Closing the queue lets consumers drain what
//! is already queued before they see end-of-stream.
//!
//! The queue is built on Tokio's `mpsc` channel and a cancellation token.
//! Neither needs a running Tokio runtime, so the async methods can also be
//! driven by `futures::executor::block_on` from plain threads.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

mod builder;
mod errors;

pub use builder::EventQueueBuilder;
pub use errors::{PushError, QueueConfigError};

use crate::event::Event;

// Default capacity when the builder is not told otherwise.
// This is an internal implementation detail and may change.
const DEFAULT_CAPACITY: usize = 64;
/// Largest supported capacity for [`EventQueueBuilder::capacity`].
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

// Compile-time guard: DEFAULT_CAPACITY must not exceed MAX_QUEUE_CAPACITY.
const_assert!(DEFAULT_CAPACITY <= MAX_QUEUE_CAPACITY);

/// Behaviour of [`BoundedEventQueue::push`] when the queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Suspend the producer until a consumer frees a slot.
    #[default]
    Block,
    /// Return [`PushError::QueueFull`] immediately.
    Drop,
}

struct QueueInner {
    tx: mpsc::Sender<Event>,
    rx: Mutex<mpsc::Receiver<Event>>,
    closed: CancellationToken,
    overflow_policy: OverflowPolicy,
}

/// Cloneable handle to a bounded multi-producer, multi-consumer event queue.
///
/// Every clone refers to the same queue; producers and consumers each hold
/// their own clone.
#[derive(Clone)]
pub struct BoundedEventQueue(Arc<QueueInner>);

impl std::fmt::Debug for BoundedEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedEventQueue")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("overflow_policy", &self.0.overflow_policy)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl BoundedEventQueue {
    /// Start building a new queue.
    #[must_use]
    pub fn builder() -> EventQueueBuilder { EventQueueBuilder::default() }

    pub(super) fn with_capacity_and_policy(
        capacity: usize,
        overflow_policy: OverflowPolicy,
    ) -> Result<Self, QueueConfigError> {
        if capacity == 0 || capacity > MAX_QUEUE_CAPACITY {
            return Err(QueueConfigError::InvalidCapacity(capacity));
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok(Self(Arc::new(QueueInner {
            tx,
            rx: Mutex::new(rx),
            closed: CancellationToken::new(),
            overflow_policy,
        })))
    }

    /// Enqueue an event according to the configured [`OverflowPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`PushError::QueueFull`] under [`OverflowPolicy::Drop`] when
    /// no slot is free and [`PushError::Closed`] once the queue is closed.
    pub async fn push(&self, event: Event) -> Result<(), PushError> {
        match self.0.overflow_policy {
            OverflowPolicy::Block => self.push_wait(event).await,
            OverflowPolicy::Drop => self.try_push(event),
        }
    }

    /// Enqueue an event, waiting for a free slot if necessary.
    ///
    /// A producer suspended here is released with [`PushError::Closed`] if
    /// the queue is closed while it waits.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::Closed`] if the queue is or becomes closed.
    pub async fn push_wait(&self, event: Event) -> Result<(), PushError> {
        let event_id = event.event_id();
        if self.is_closed() {
            return Err(PushError::Closed { event_id });
        }
        let permit = tokio::select! {
            biased;
            () = self.0.closed.cancelled() => return Err(PushError::Closed { event_id }),
            permit = self.0.tx.reserve() => permit.map_err(|_| PushError::Closed { event_id })?,
        };
        permit.send(event);
        debug!(%event_id, "event queued");
        Ok(())
    }

    /// Enqueue an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`PushError::QueueFull`] if no slot is free and
    /// [`PushError::Closed`] if the queue is closed.
    pub fn try_push(&self, event: Event) -> Result<(), PushError> {
        let event_id = event.event_id();
        if self.is_closed() {
            return Err(PushError::Closed { event_id });
        }
        match self.0.tx.try_send(event) {
            Ok(()) => {
                debug!(%event_id, "event queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(PushError::QueueFull { event_id }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PushError::Closed { event_id }),
        }
    }

    /// Dequeue the next event, waiting until one is available.
    ///
    /// Returns `None` once the queue is closed and drained. Every later call
    /// also returns `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamer::queue::BoundedEventQueue;
    ///
    /// # futures::executor::block_on(async {
    /// let queue = BoundedEventQueue::builder()
    ///     .capacity(1)
    ///     .build()
    ///     .expect("failed to build queue");
    /// queue.close();
    /// assert!(queue.pop().await.is_none());
    /// # });
    /// ```
    pub async fn pop(&self) -> Option<Event> {
        let mut rx = self.0.rx.lock().await;
        tokio::select! {
            biased;
            event = rx.recv() => event,
            () = self.0.closed.cancelled() => {
                // Closing the receiver rejects new reservations while still
                // yielding events from permits taken before the close.
                rx.close();
                rx.recv().await
            }
        }
    }

    /// Dequeue an event if one is immediately available.
    ///
    /// Returns `None` when the queue is empty or another consumer currently
    /// holds the receive side.
    pub fn try_pop(&self) -> Option<Event> {
        let mut rx = self.0.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }

    /// Mark the queue closed.
    ///
    /// No further pushes succeed, producers blocked in
    /// [`push_wait`](Self::push_wait) are released with an error, and blocked
    /// consumers wake once the queued events have drained.
    pub fn close(&self) {
        if !self.0.closed.is_cancelled() {
            debug!(remaining = self.len(), "event queue closed");
        }
        self.0.closed.cancel();
    }

    /// Report whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.0.closed.is_cancelled() }

    /// Number of occupied or reserved slots.
    #[must_use]
    pub fn len(&self) -> usize { self.0.tx.max_capacity() - self.0.tx.capacity() }

    /// Report whether no slot is occupied or reserved.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Fixed capacity chosen at construction.
    #[must_use]
    pub fn capacity(&self) -> usize { self.0.tx.max_capacity() }

    /// Configured overflow policy.
    #[must_use]
    pub fn overflow_policy(&self) -> OverflowPolicy { self.0.overflow_policy }
}

#[cfg(test)]
mod tests;
