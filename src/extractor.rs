//! Consumer-facing handle that pulls completed events one at a time.
//!
//! [`EventExtractor`] is what an input adapter holds. Each call hands out
//! exactly one [`Event`], transferring ownership to the caller, or `None`
//! once the pipeline has shut down and every queued event has been taken.

use std::sync::Arc;

use tracing::debug;

use crate::{event::Event, queue::BoundedEventQueue, stats::StreamStats};

/// Cloneable consumer handle over the event queue.
///
/// Clones share the queue; each event goes to whichever clone pops it first.
#[derive(Clone, Debug)]
pub struct EventExtractor {
    queue: BoundedEventQueue,
    stats: Arc<StreamStats>,
}

impl EventExtractor {
    /// Create an extractor reading from `queue`.
    #[must_use]
    pub fn new(queue: BoundedEventQueue, stats: Arc<StreamStats>) -> Self { Self { queue, stats } }

    /// Take the next event, blocking the calling thread until one arrives.
    ///
    /// Returns `None` when input is exhausted: the queue was closed and has
    /// drained. This is the synchronous entry point for host read loops and
    /// must not be called from inside an async runtime worker; use
    /// [`extract_async`](Self::extract_async) there instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamer::{Streamer, StreamerConfig, fragment::{EventId, Fragment, FragmentIndex}};
    ///
    /// let streamer = Streamer::new(StreamerConfig::default()).expect("valid config");
    /// streamer
    ///     .assembler()
    ///     .insert_blocking(Fragment::new(EventId::new(1), FragmentIndex::zero(), 1, &b"x"[..]))
    ///     .expect("accepted");
    /// streamer.shutdown();
    ///
    /// let extractor = streamer.extractor();
    /// assert_eq!(extractor.extract().map(|event| event.event_id()), Some(EventId::new(1)));
    /// assert!(extractor.extract().is_none());
    /// ```
    #[must_use]
    pub fn extract(&self) -> Option<Event> { futures::executor::block_on(self.extract_async()) }

    /// Take the next event, waiting asynchronously until one arrives.
    ///
    /// Returns `None` when input is exhausted.
    pub async fn extract_async(&self) -> Option<Event> {
        let event = self.queue.pop().await;
        self.observe(event)
    }

    /// Take an event only if one is ready now.
    ///
    /// `None` here means "nothing yet", not end of input; check
    /// [`is_exhausted`](Self::is_exhausted) to tell the two apart.
    #[must_use]
    pub fn try_extract(&self) -> Option<Event> {
        let event = self.queue.try_pop()?;
        self.observe(Some(event))
    }

    /// Report whether the queue is closed and holds no events.
    #[must_use]
    pub fn is_exhausted(&self) -> bool { self.queue.is_closed() && self.queue.is_empty() }

    fn observe(&self, event: Option<Event>) -> Option<Event> {
        match &event {
            Some(event) => {
                self.stats.record_extracted();
                debug!(event_id = %event.event_id(), "event extracted");
            }
            None => debug!("event input exhausted"),
        }
        event
    }
}
