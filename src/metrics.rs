//! Metric helpers for `streamer`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. When the
//! `metrics` feature is disabled the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking fragments accepted into the buffer.
pub const FRAGMENTS_ACCEPTED: &str = "streamer_fragments_accepted_total";
/// Name of the counter tracking rejected fragments.
pub const FRAGMENTS_REJECTED: &str = "streamer_fragments_rejected_total";
/// Name of the counter tracking event lifecycle outcomes.
pub const EVENTS_TOTAL: &str = "streamer_events_total";
/// Name of the gauge tracking partial events held by the buffer.
///
/// Updated whenever a partial event is created, completed, evicted, or
/// cleared at shutdown.
pub const PARTIAL_EVENTS: &str = "streamer_partial_events";

/// Why a fragment was turned away.
#[derive(Clone, Copy, Debug)]
pub enum Rejection {
    /// The `(event_id, fragment_index)` pair was already seen.
    Duplicate,
    /// The header failed validation.
    Malformed,
    /// The fragment's event had already been discarded as stale.
    Late,
}

impl Rejection {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only read by metric labels"))]
    fn as_str(self) -> &'static str {
        match self {
            Rejection::Duplicate => "duplicate",
            Rejection::Malformed => "malformed",
            Rejection::Late => "late",
        }
    }
}

/// Terminal or intermediate state reached by an event.
#[derive(Clone, Copy, Debug)]
pub enum Outcome {
    /// All fragments arrived and the event was assembled.
    Completed,
    /// A consumer took the event from the queue.
    Extracted,
    /// The partial event aged out or was cleared at shutdown.
    Discarded,
    /// The queue was full under the drop policy, or closed.
    Dropped,
}

impl Outcome {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only read by metric labels"))]
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Extracted => "extracted",
            Outcome::Discarded => "discarded",
            Outcome::Dropped => "dropped",
        }
    }
}

/// Record an accepted fragment.
pub fn inc_fragments() {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_ACCEPTED).increment(1);
}

/// Record a rejected fragment.
pub fn inc_rejected(reason: Rejection) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_REJECTED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a single event outcome.
pub fn inc_events(outcome: Outcome) { add_events(outcome, 1); }

/// Record `count` events reaching `outcome`.
pub fn add_events(outcome: Outcome, count: u64) {
    #[cfg(feature = "metrics")]
    counter!(EVENTS_TOTAL, "outcome" => outcome.as_str()).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = (outcome, count);
}

/// Publish the number of partial events currently buffered.
#[cfg_attr(
    feature = "metrics",
    expect(
        clippy::cast_precision_loss,
        reason = "gauge values are approximate by nature"
    )
)]
pub fn set_partial_events(count: usize) {
    #[cfg(feature = "metrics")]
    gauge!(PARTIAL_EVENTS).set(count as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}
