//! Health counters shared by the producer and consumer handles.
//!
//! Sustained discards or drops indicate upstream overload or a failed
//! producer. The counters are plain atomics so every handle can record
//! without locking; hosts read them through [`StatsSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::metrics;

/// Lock-free counters for one pipeline.
#[derive(Debug, Default)]
pub struct StreamStats {
    fragments_accepted: AtomicU64,
    duplicate_fragments: AtomicU64,
    malformed_fragments: AtomicU64,
    late_fragments: AtomicU64,
    events_completed: AtomicU64,
    events_extracted: AtomicU64,
    events_discarded: AtomicU64,
    events_dropped: AtomicU64,
}

/// Point-in-time copy of [`StreamStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub fragments_accepted: u64,
    pub duplicate_fragments: u64,
    pub malformed_fragments: u64,
    pub late_fragments: u64,
    pub events_completed: u64,
    pub events_extracted: u64,
    pub events_discarded: u64,
    pub events_dropped: u64,
}

impl StatsSnapshot {
    /// Events that ended without reaching a consumer.
    #[must_use]
    pub const fn events_lost(&self) -> u64 { self.events_discarded + self.events_dropped }
}

impl StreamStats {
    pub(crate) fn record_fragment_accepted(&self) {
        self.fragments_accepted.fetch_add(1, Ordering::Relaxed);
        metrics::inc_fragments();
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicate_fragments.fetch_add(1, Ordering::Relaxed);
        metrics::inc_rejected(metrics::Rejection::Duplicate);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed_fragments.fetch_add(1, Ordering::Relaxed);
        metrics::inc_rejected(metrics::Rejection::Malformed);
    }

    pub(crate) fn record_late(&self) {
        self.late_fragments.fetch_add(1, Ordering::Relaxed);
        metrics::inc_rejected(metrics::Rejection::Late);
    }

    pub(crate) fn record_completed(&self) {
        self.events_completed.fetch_add(1, Ordering::Relaxed);
        metrics::inc_events(metrics::Outcome::Completed);
    }

    pub(crate) fn record_extracted(&self) {
        self.events_extracted.fetch_add(1, Ordering::Relaxed);
        metrics::inc_events(metrics::Outcome::Extracted);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        if count == 0 {
            return;
        }
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        self.events_discarded.fetch_add(count, Ordering::Relaxed);
        metrics::add_events(metrics::Outcome::Discarded, count);
    }

    pub(crate) fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
        metrics::inc_events(metrics::Outcome::Dropped);
    }

    /// Copy the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fragments_accepted: self.fragments_accepted.load(Ordering::Relaxed),
            duplicate_fragments: self.duplicate_fragments.load(Ordering::Relaxed),
            malformed_fragments: self.malformed_fragments.load(Ordering::Relaxed),
            late_fragments: self.late_fragments.load(Ordering::Relaxed),
            events_completed: self.events_completed.load(Ordering::Relaxed),
            events_extracted: self.events_extracted.load(Ordering::Relaxed),
            events_discarded: self.events_discarded.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}
