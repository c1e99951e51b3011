//! Builder for configuring the event queue.

use super::{BoundedEventQueue, DEFAULT_CAPACITY, OverflowPolicy, QueueConfigError};

/// Builder for [`BoundedEventQueue`].
///
/// Defaults to 64 slots and [`OverflowPolicy::Block`].
/// Construct via [`BoundedEventQueue::builder`] or [`Default::default`].
///
/// # Examples
///
/// ```
/// use streamer::queue::{BoundedEventQueue, OverflowPolicy};
///
/// let queue = BoundedEventQueue::builder()
///     .capacity(8)
///     .overflow_policy(OverflowPolicy::Drop)
///     .build()
///     .expect("failed to build queue");
/// assert_eq!(queue.capacity(), 8);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EventQueueBuilder {
    capacity: usize,
    overflow_policy: OverflowPolicy,
}

impl Default for EventQueueBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl EventQueueBuilder {
    /// Set the number of completed events the queue can hold.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the behaviour of [`BoundedEventQueue::push`] when the queue is full.
    #[must_use]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Build the configured [`BoundedEventQueue`].
    ///
    /// # Errors
    ///
    /// Returns [`QueueConfigError::InvalidCapacity`] if the capacity is zero
    /// or strictly greater than [`super::MAX_QUEUE_CAPACITY`].
    pub fn build(self) -> Result<BoundedEventQueue, QueueConfigError> {
        BoundedEventQueue::with_capacity_and_policy(self.capacity, self.overflow_policy)
    }
}
