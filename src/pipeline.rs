//! One-stop construction of a complete assembly pipeline.
//!
//! [`Streamer`] builds the buffer, queue, and shared counters once from a
//! [`StreamerConfig`] and hands out producer ([`EventAssembler`]) and
//! consumer ([`EventExtractor`]) handles. Nothing inside the crate looks the
//! pipeline up globally; callers pass the handles to whoever needs them.

use std::sync::Arc;

use tracing::info;

use crate::{
    assembler::EventAssembler,
    buffer::{FragmentBuffer, IncompleteEventDiscarded},
    config::{ConfigError, StreamerConfig},
    extractor::EventExtractor,
    input::FragmentInput,
    queue::{BoundedEventQueue, QueueConfigError},
    stats::{StatsSnapshot, StreamStats},
};

/// A configured fragment-to-event pipeline.
#[derive(Debug)]
pub struct Streamer {
    config: StreamerConfig,
    assembler: EventAssembler,
    extractor: EventExtractor,
    stats: Arc<StreamStats>,
}

impl Streamer {
    /// Build a pipeline from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails validation.
    pub fn new(config: StreamerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stats = Arc::new(StreamStats::default());
        let buffer = Arc::new(FragmentBuffer::from_config(&config, Arc::clone(&stats)));
        let queue = BoundedEventQueue::builder()
            .capacity(config.queue_capacity)
            .overflow_policy(config.overflow_policy)
            .build()
            .map_err(|QueueConfigError::InvalidCapacity(capacity)| {
                ConfigError::InvalidCapacity(capacity)
            })?;
        let assembler = EventAssembler::with_drop_logging(
            buffer,
            queue.clone(),
            Arc::clone(&stats),
            config.drop_log_every_n,
            config.drop_log_interval(),
        );
        let extractor = EventExtractor::new(queue, Arc::clone(&stats));
        info!(
            queue_capacity = config.queue_capacity,
            staleness_window_ms = config.staleness_window_ms,
            overflow_policy = ?config.overflow_policy,
            duplicate_policy = ?config.duplicate_policy,
            "streamer pipeline ready"
        );
        Ok(Self {
            config,
            assembler,
            extractor,
            stats,
        })
    }

    /// Configuration the pipeline was built from.
    #[must_use]
    pub fn config(&self) -> &StreamerConfig { &self.config }

    /// Producer handle; clone it once per producer.
    #[must_use]
    pub fn assembler(&self) -> EventAssembler { self.assembler.clone() }

    /// Consumer handle; clone it once per consumer.
    #[must_use]
    pub fn extractor(&self) -> EventExtractor { self.extractor.clone() }

    /// Host-facing input reading from this pipeline.
    #[must_use]
    pub fn input(&self) -> FragmentInput { FragmentInput::new(self.extractor()) }

    /// Current health counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot { self.stats.snapshot() }

    /// Stop accepting fragments, discard partial events, and close the queue.
    ///
    /// Consumers still receive every event queued before the call.
    pub fn shutdown(&self) -> Vec<IncompleteEventDiscarded> {
        let discarded = self.assembler.shutdown();
        info!(
            discarded = discarded.len(),
            stats = ?self.stats.snapshot(),
            "streamer pipeline shut down"
        );
        discarded
    }

    /// Split into the producer and consumer handles.
    #[must_use]
    pub fn into_parts(self) -> (EventAssembler, EventExtractor) { (self.assembler, self.extractor) }
}
