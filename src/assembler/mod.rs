//! Producer-side pipeline: completion, assembly, and hand-off to the queue.
//!
//! [`build`] turns a complete [`PartialEvent`] into an immutable [`Event`].
//! [`EventAssembler`] is the cloneable handle producers feed fragments
//! into: it inserts into the [`FragmentBuffer`], and when an insert completes
//! an event it pushes that event to the [`BoundedEventQueue`]. The buffer's
//! shard lock is always released before the push, so queue back-pressure
//! never holds up producers working on other events.

use std::{
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use tracing::{debug, warn};

use crate::{
    buffer::{FragmentBuffer, IncompleteEventDiscarded, InsertError, PartialEvent},
    event::Event,
    fragment::{EventId, Fragment},
    queue::{BoundedEventQueue, PushError},
    stats::StreamStats,
};

/// Assemble a complete partial event into an [`Event`].
///
/// Payloads are ordered by fragment index into a contiguous sequence. The
/// buffer only calls this once every index in `[0, expected_count)` has
/// arrived, so assembly cannot fail.
#[must_use]
pub fn build(partial: PartialEvent, completed_at: Instant) -> Event {
    debug_assert!(partial.is_complete(), "only complete events are assembled");
    let event_id = partial.event_id();
    Event::new(event_id, partial.into_ordered_payloads(), completed_at)
}

/// What happened to a fragment handed to [`EventAssembler::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The fragment was stored (or ignored as a duplicate); its event is
    /// still incomplete.
    Pending,
    /// The fragment completed its event, which is now queued.
    Queued { event_id: EventId },
    /// The fragment completed its event but the full queue rejected it.
    Dropped { event_id: EventId },
}

/// Throttle for drop warnings.
///
/// A warning is emitted every `every_n` drops, or when `interval` has passed
/// since the last warning, whichever comes first.
#[derive(Debug)]
struct DropLog {
    pending: AtomicUsize,
    last_log: Mutex<Instant>,
    every_n: usize,
    interval: Duration,
}

impl DropLog {
    fn new(every_n: usize, interval: Duration) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            last_log: Mutex::new(Instant::now()),
            every_n: every_n.max(1),
            interval,
        }
    }

    fn record(&self, err: PushError) {
        let dropped = self.pending.fetch_add(1, Ordering::Relaxed) + 1;
        let mut last = match self.last_log.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        if dropped % self.every_n == 0 || now.duration_since(*last) > self.interval {
            warn!(
                event_id = %err.event_id(),
                dropped,
                log_every_n = self.every_n,
                log_interval = ?self.interval,
                "event queue full; completed events dropped"
            );
            *last = now;
            self.pending.store(0, Ordering::Relaxed);
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize { self.pending.load(Ordering::Relaxed) }
}

/// Cloneable handle used by producers to feed fragments into the pipeline.
#[derive(Clone, Debug)]
pub struct EventAssembler {
    buffer: Arc<FragmentBuffer>,
    queue: BoundedEventQueue,
    stats: Arc<StreamStats>,
    drops: Arc<DropLog>,
}

impl EventAssembler {
    /// Wire an assembler to an existing buffer and queue.
    ///
    /// `stats` should be the same counters the buffer records into so the
    /// snapshot covers the whole pipeline.
    #[must_use]
    pub fn new(
        buffer: Arc<FragmentBuffer>,
        queue: BoundedEventQueue,
        stats: Arc<StreamStats>,
    ) -> Self {
        Self::with_drop_logging(buffer, queue, stats, 1, Duration::from_secs(10))
    }

    /// Wire an assembler with a custom drop-warning cadence.
    #[must_use]
    pub fn with_drop_logging(
        buffer: Arc<FragmentBuffer>,
        queue: BoundedEventQueue,
        stats: Arc<StreamStats>,
        drop_log_every_n: usize,
        drop_log_interval: Duration,
    ) -> Self {
        Self {
            buffer,
            queue,
            stats,
            drops: Arc::new(DropLog::new(drop_log_every_n, drop_log_interval)),
        }
    }

    /// Insert a fragment using the current time.
    ///
    /// Under [`OverflowPolicy::Block`](crate::queue::OverflowPolicy::Block)
    /// the returned future waits while the queue is full.
    ///
    /// # Errors
    ///
    /// See [`insert_at`](Self::insert_at).
    pub async fn insert(&self, fragment: Fragment) -> Result<InsertOutcome, InsertError> {
        self.insert_at(fragment, Instant::now()).await
    }

    /// Insert a fragment using an explicit clock reading.
    ///
    /// # Errors
    ///
    /// Returns the buffer's [`InsertError`] for malformed, duplicate, or
    /// post-shutdown fragments. A completed event that meets a closed queue
    /// is counted as dropped and reported as [`InsertError::Closed`].
    pub async fn insert_at(
        &self,
        fragment: Fragment,
        now: Instant,
    ) -> Result<InsertOutcome, InsertError> {
        let Some(event) = self.buffer.insert_at(fragment, now)? else {
            return Ok(InsertOutcome::Pending);
        };
        let event_id = event.event_id();
        match self.queue.push(event).await {
            Ok(()) => Ok(InsertOutcome::Queued { event_id }),
            Err(err @ PushError::QueueFull { .. }) => {
                self.stats.record_dropped();
                self.drops.record(err);
                Ok(InsertOutcome::Dropped { event_id })
            }
            Err(PushError::Closed { .. }) => {
                self.stats.record_dropped();
                warn!(%event_id, "completed event dropped: queue closed");
                Err(InsertError::Closed { event_id })
            }
        }
    }

    /// Insert a fragment from a synchronous producer thread.
    ///
    /// Must not be called from inside an async runtime worker, as it blocks
    /// the calling thread while the queue is full.
    ///
    /// # Errors
    ///
    /// See [`insert_at`](Self::insert_at).
    pub fn insert_blocking(&self, fragment: Fragment) -> Result<InsertOutcome, InsertError> {
        futures::executor::block_on(self.insert(fragment))
    }

    /// Run an eviction sweep now rather than waiting for the next insert.
    pub fn purge_expired(&self) -> Vec<IncompleteEventDiscarded> { self.buffer.purge_expired() }

    /// Stop the pipeline.
    ///
    /// The buffer stops accepting fragments and discards every partial event;
    /// then the queue is closed so consumers drain what is queued and see
    /// end-of-input. Returns the discard reports.
    pub fn shutdown(&self) -> Vec<IncompleteEventDiscarded> {
        let discarded = self.buffer.close();
        self.queue.close();
        debug!(discarded = discarded.len(), "assembler shut down");
        discarded
    }

    /// Borrow the underlying buffer.
    #[must_use]
    pub fn buffer(&self) -> &FragmentBuffer { &self.buffer }

    /// Borrow the output queue.
    #[must_use]
    pub fn queue(&self) -> &BoundedEventQueue { &self.queue }
}
