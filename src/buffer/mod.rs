//! Concurrent holding area for fragments of not-yet-complete events.
//!
//! [`FragmentBuffer`] keys partial events by [`EventId`] in a sharded
//! [`DashMap`]. Lookup-or-create, insert, completion check, and removal all
//! happen under one shard lock, so no thread ever observes a half-applied
//! insert and exactly one insert completes each event. Partial events older
//! than the staleness window are evicted by an opportunistic sweep that
//! piggybacks on inserts.

use std::{
    sync::{
        Arc,
        Mutex,
        TryLockError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

mod error;
mod partial;

pub use error::{IncompleteEventDiscarded, InsertError};
pub use partial::{AcceptStatus, PartialEvent};

use crate::{
    assembler,
    config::StreamerConfig,
    event::Event,
    fragment::{EventId, Fragment, FragmentError, FragmentHeader},
    metrics,
    stats::StreamStats,
};

/// Smallest interval between opportunistic sweeps.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Treatment of a fragment whose `(event_id, fragment_index)` was already seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Report [`InsertError::Duplicate`] to the producer.
    #[default]
    Reject,
    /// Log at debug level and carry on as if the fragment never arrived.
    Ignore,
}

#[derive(Debug)]
enum Slot {
    Partial(PartialEvent),
    /// Marker left behind for one staleness window after completion so late
    /// duplicates of an assembled event are still recognised.
    Completed { at: Instant },
    /// Tombstone left for one staleness window after eviction so stragglers
    /// cannot restart an event that was already reported as discarded.
    Discarded { at: Instant },
}

impl Slot {
    fn into_partial(self) -> Option<PartialEvent> {
        match self {
            Slot::Partial(partial) => Some(partial),
            Slot::Completed { .. } | Slot::Discarded { .. } => None,
        }
    }
}

/// Stateful fragment store with staleness-based eviction.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use streamer::{
///     DuplicatePolicy,
///     FragmentBuffer,
///     fragment::{EventId, Fragment, FragmentIndex},
/// };
///
/// let buffer = FragmentBuffer::new(Duration::from_secs(5), DuplicatePolicy::Reject);
/// let id = EventId::new(1);
/// let tail = Fragment::new(id, FragmentIndex::new(1), 2, &b"world"[..]);
/// let head = Fragment::new(id, FragmentIndex::zero(), 2, &b"hello "[..]);
///
/// assert!(buffer.insert(tail).expect("accepted").is_none());
/// let event = buffer
///     .insert(head)
///     .expect("accepted")
///     .expect("event complete");
/// assert_eq!(event.concat().as_ref(), b"hello world");
/// ```
#[derive(Debug)]
pub struct FragmentBuffer {
    staleness_window: Duration,
    sweep_interval: Duration,
    duplicate_policy: DuplicatePolicy,
    slots: DashMap<EventId, Slot>,
    last_sweep: Mutex<Instant>,
    closed: AtomicBool,
    partials: AtomicUsize,
    stats: Arc<StreamStats>,
}

impl FragmentBuffer {
    /// Create a buffer with its own private statistics.
    #[must_use]
    pub fn new(staleness_window: Duration, duplicate_policy: DuplicatePolicy) -> Self {
        Self::with_stats(
            staleness_window,
            duplicate_policy,
            Arc::new(StreamStats::default()),
        )
    }

    /// Create a buffer that records into shared statistics.
    #[must_use]
    pub fn with_stats(
        staleness_window: Duration,
        duplicate_policy: DuplicatePolicy,
        stats: Arc<StreamStats>,
    ) -> Self {
        Self {
            staleness_window,
            sweep_interval: (staleness_window / 4).max(MIN_SWEEP_INTERVAL),
            duplicate_policy,
            slots: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
            closed: AtomicBool::new(false),
            partials: AtomicUsize::new(0),
            stats,
        }
    }

    /// Create a buffer from the relevant [`StreamerConfig`] fields.
    #[must_use]
    pub fn from_config(config: &StreamerConfig, stats: Arc<StreamStats>) -> Self {
        Self::with_stats(config.staleness_window(), config.duplicate_policy, stats)
    }

    /// Insert a fragment using the current time.
    ///
    /// Returns `Ok(Some(_))` when the fragment completes its event (the event
    /// has then left the buffer) and `Ok(None)` while more fragments are
    /// required.
    ///
    /// # Errors
    ///
    /// See [`insert_at`](Self::insert_at).
    pub fn insert(&self, fragment: Fragment) -> Result<Option<Event>, InsertError> {
        self.insert_at(fragment, Instant::now())
    }

    /// Insert a fragment using an explicit clock reading.
    ///
    /// Accepting an explicit `now` keeps staleness tests deterministic. The
    /// call may first run an eviction sweep if the sweep interval elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`InsertError::Malformed`] when the header is invalid or
    /// disagrees with earlier fragments of the event,
    /// [`InsertError::Duplicate`] for a repeated fragment under
    /// [`DuplicatePolicy::Reject`], [`InsertError::Discarded`] for a
    /// straggler of an event evicted within the last staleness window, and
    /// [`InsertError::Closed`] after [`close`](Self::close).
    pub fn insert_at(&self, fragment: Fragment, now: Instant) -> Result<Option<Event>, InsertError> {
        let header = *fragment.header();
        let event_id = header.event_id();
        if self.is_closed() {
            return Err(InsertError::Closed { event_id });
        }
        if let Err(err) = header.validate() {
            return Err(self.malformed(err));
        }

        self.maybe_sweep(now);

        let entry = self.slots.entry(event_id);
        // Re-checked under the shard lock so `close` cannot miss a partial
        // created concurrently with it.
        if self.is_closed() {
            return Err(InsertError::Closed { event_id });
        }

        match entry {
            Entry::Vacant(vacant) => {
                let mut partial = PartialEvent::new(event_id, header.fragment_count(), now);
                match partial.accept(&fragment).map_err(|err| self.malformed(err))? {
                    AcceptStatus::Complete => {
                        vacant.insert(Slot::Completed { at: now });
                        self.stats.record_fragment_accepted();
                        Ok(Some(self.complete(partial, now)))
                    }
                    AcceptStatus::Incomplete | AcceptStatus::Duplicate => {
                        // Counted while the shard lock is held so completion
                        // can never decrement before this increment lands.
                        let partials = self.partials.fetch_add(1, Ordering::Relaxed) + 1;
                        vacant.insert(Slot::Partial(partial));
                        self.stats.record_fragment_accepted();
                        metrics::set_partial_events(partials);
                        debug!(%event_id, index = %header.fragment_index(), "partial event started");
                        Ok(None)
                    }
                }
            }
            Entry::Occupied(mut occupied) => {
                let status = match occupied.get_mut() {
                    Slot::Completed { .. } => AcceptStatus::Duplicate,
                    Slot::Discarded { .. } => return Err(self.late(header)),
                    Slot::Partial(partial) => {
                        partial.accept(&fragment).map_err(|err| self.malformed(err))?
                    }
                };
                match status {
                    AcceptStatus::Duplicate => self.duplicate(header),
                    AcceptStatus::Incomplete => {
                        self.stats.record_fragment_accepted();
                        Ok(None)
                    }
                    AcceptStatus::Complete => {
                        self.stats.record_fragment_accepted();
                        metrics::set_partial_events(
                            self.partials.fetch_sub(1, Ordering::Relaxed).saturating_sub(1),
                        );
                        let completed = occupied
                            .insert(Slot::Completed { at: now })
                            .into_partial()
                            .map(|partial| self.complete(partial, now));
                        Ok(completed)
                    }
                }
            }
        }
    }

    /// Remove partial events that exceeded the staleness window.
    ///
    /// Returns a report for each discarded event.
    pub fn purge_expired(&self) -> Vec<IncompleteEventDiscarded> {
        self.purge_expired_at(Instant::now())
    }

    /// Remove partial events that exceeded the staleness window using an
    /// explicit clock reading.
    ///
    /// An evicted event leaves a tombstone that rejects its stragglers for
    /// one further window. Completion markers and tombstones older than the
    /// window are forgotten at the same time. Returns a report for each discarded event.
    pub fn purge_expired_at(&self, now: Instant) -> Vec<IncompleteEventDiscarded> {
        let window = self.staleness_window;
        let mut discarded = Vec::new();

        // `DashMap::retain` takes each shard's write lock in turn, so inserts
        // into other shards proceed while the sweep runs.
        self.slots.retain(|_, slot| match slot {
            Slot::Partial(partial) => {
                if now.saturating_duration_since(partial.first_seen()) >= window {
                    discarded.push(partial.discard_report());
                    *slot = Slot::Discarded { at: now };
                }
                true
            }
            Slot::Completed { at } | Slot::Discarded { at } => {
                now.saturating_duration_since(*at) < window
            }
        });

        if !discarded.is_empty() {
            let before = self.partials.fetch_sub(discarded.len(), Ordering::Relaxed);
            metrics::set_partial_events(before.saturating_sub(discarded.len()));
        }
        self.report_discarded(&discarded, "staleness window elapsed");
        discarded
    }

    /// Stop accepting fragments and discard every in-flight partial event.
    ///
    /// Discarded partial events are never surfaced as completed events.
    /// Returns a report for each of them.
    pub fn close(&self) -> Vec<IncompleteEventDiscarded> {
        self.closed.store(true, Ordering::SeqCst);
        let mut discarded = Vec::new();
        self.slots.retain(|_, slot| {
            if let Slot::Partial(partial) = slot {
                discarded.push(partial.discard_report());
            }
            false
        });
        self.partials.store(0, Ordering::Relaxed);
        metrics::set_partial_events(0);
        info!(discarded = discarded.len(), "fragment buffer closed");
        self.report_discarded(&discarded, "buffer closed");
        discarded
    }

    /// Report whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }

    /// Number of partial events currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Partial(_)))
            .count()
    }

    /// Report whether a partial event for `event_id` is buffered.
    #[must_use]
    pub fn contains_partial(&self, event_id: EventId) -> bool {
        self.slots
            .get(&event_id)
            .is_some_and(|slot| matches!(slot.value(), Slot::Partial(_)))
    }

    /// Staleness window this buffer was configured with.
    #[must_use]
    pub const fn staleness_window(&self) -> Duration { self.staleness_window }

    fn maybe_sweep(&self, now: Instant) {
        let mut last = match self.last_sweep.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            // Another producer is already sweeping.
            Err(TryLockError::WouldBlock) => return,
        };
        if now.saturating_duration_since(*last) < self.sweep_interval {
            return;
        }
        *last = now;
        drop(last);
        self.purge_expired_at(now);
    }

    fn complete(&self, partial: PartialEvent, now: Instant) -> Event {
        self.stats.record_completed();
        debug!(
            event_id = %partial.event_id(),
            fragments = partial.expected_count(),
            "event complete"
        );
        assembler::build(partial, now)
    }

    fn duplicate(&self, header: FragmentHeader) -> Result<Option<Event>, InsertError> {
        self.stats.record_duplicate();
        let event_id = header.event_id();
        let fragment_index = header.fragment_index();
        match self.duplicate_policy {
            DuplicatePolicy::Reject => {
                warn!(%event_id, %fragment_index, "duplicate fragment rejected");
                Err(InsertError::Duplicate {
                    event_id,
                    fragment_index,
                })
            }
            DuplicatePolicy::Ignore => {
                debug!(%event_id, %fragment_index, "duplicate fragment ignored");
                Ok(None)
            }
        }
    }

    fn late(&self, header: FragmentHeader) -> InsertError {
        self.stats.record_late();
        let event_id = header.event_id();
        let fragment_index = header.fragment_index();
        warn!(%event_id, %fragment_index, "fragment for discarded event rejected");
        InsertError::Discarded {
            event_id,
            fragment_index,
        }
    }

    fn malformed(&self, err: FragmentError) -> InsertError {
        self.stats.record_malformed();
        warn!(error = %err, "malformed fragment rejected");
        InsertError::Malformed(err)
    }

    fn report_discarded(&self, discarded: &[IncompleteEventDiscarded], reason: &'static str) {
        for report in discarded {
            warn!(
                event_id = %report.event_id,
                received = report.received_count,
                expected = report.expected_count,
                reason,
                "incomplete event discarded"
            );
        }
        self.stats.record_discarded(discarded.len());
    }
}
