//! Adapter between the event pipeline and a host framework's read loop.
//!
//! Hosts pull records through the [`EventSource`] seam. [`FragmentInput`]
//! implements it over an [`EventExtractor`] and latches end-of-input, so once
//! it has reported exhaustion it never touches the queue again.

use tracing::info;

use crate::{event::Event, extractor::EventExtractor};

/// A pull-based source of assembled events.
pub trait EventSource {
    /// Read the next event.
    ///
    /// Returns `None` when input is exhausted. After that every call returns
    /// `None`.
    fn read(&mut self) -> Option<Event>;
}

/// Host-side input that reads completed events from the pipeline.
#[derive(Debug)]
pub struct FragmentInput {
    extractor: EventExtractor,
    exhausted: bool,
    delivered: u64,
}

impl FragmentInput {
    /// Create an input that reads through `extractor`.
    #[must_use]
    pub fn new(extractor: EventExtractor) -> Self {
        Self {
            extractor,
            exhausted: false,
            delivered: 0,
        }
    }

    /// Report whether end-of-input has been observed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool { self.exhausted }

    /// Number of events handed out by this input.
    #[must_use]
    pub fn delivered(&self) -> u64 { self.delivered }
}

impl EventSource for FragmentInput {
    fn read(&mut self) -> Option<Event> {
        if self.exhausted {
            return None;
        }
        if let Some(event) = self.extractor.extract() {
            self.delivered += 1;
            return Some(event);
        }
        self.exhausted = true;
        info!(delivered = self.delivered, "fragment input exhausted");
        None
    }
}

impl Iterator for FragmentInput {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> { self.read() }
}

impl std::iter::FusedIterator for FragmentInput {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rstest::rstest;

    use super::{EventSource, FragmentInput};
    use crate::{
        extractor::EventExtractor,
        queue::BoundedEventQueue,
        stats::StreamStats,
        test_helpers::event,
    };

    fn input_over(ids: &[u64]) -> (FragmentInput, BoundedEventQueue) {
        let queue = BoundedEventQueue::builder()
            .capacity(8)
            .build()
            .expect("failed to build queue");
        for id in ids {
            queue.try_push(event(*id)).expect("push failed");
        }
        let extractor = EventExtractor::new(queue.clone(), Arc::new(StreamStats::default()));
        (FragmentInput::new(extractor), queue)
    }

    #[rstest]
    fn reads_events_then_latches_exhaustion() {
        let (mut input, queue) = input_over(&[4, 2]);
        queue.close();

        assert_eq!(input.read().map(|e| e.event_id().get()), Some(4));
        assert_eq!(input.read().map(|e| e.event_id().get()), Some(2));
        assert!(input.read().is_none());
        assert!(input.is_exhausted());
        assert!(input.read().is_none());
        assert_eq!(input.delivered(), 2);
    }

    #[rstest]
    fn iterates_until_end_of_input() {
        let (input, queue) = input_over(&[1, 2, 3]);
        queue.close();

        let ids: Vec<u64> = input.map(|event| event.event_id().get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
