#![doc(html_root_url = "https://docs.rs/streamer/latest")]
//! Public API for the `streamer` library.
//!
//! This crate reassembles events that arrive as independently delivered
//! fragments. Producers insert fragments concurrently and in any order; once
//! every fragment of an event has arrived the event is assembled, queued in a
//! bounded FIFO, and handed to exactly one consumer. Partial events that go
//! stale are discarded rather than surfaced.
//!
//! ```
//! use streamer::{
//!     Streamer,
//!     StreamerConfig,
//!     fragment::{EventId, Fragment, FragmentIndex},
//! };
//!
//! let streamer = Streamer::new(StreamerConfig::default()).expect("valid config");
//! let producer = streamer.assembler();
//! for index in [1, 0] {
//!     let fragment = Fragment::new(EventId::new(7), FragmentIndex::new(index), 2, vec![index as u8]);
//!     producer.insert_blocking(fragment).expect("fragment accepted");
//! }
//! streamer.shutdown();
//!
//! let events: Vec<_> = streamer.input().collect();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].concat().as_ref(), &[0, 1]);
//! ```

pub mod assembler;
pub mod buffer;
pub mod config;
pub mod event;
pub mod extractor;
pub mod fragment;
pub mod input;
pub mod metrics;
pub mod pipeline;
pub mod queue;
pub mod stats;

#[cfg(test)]
mod test_helpers;

pub use assembler::{EventAssembler, InsertOutcome};
pub use buffer::{DuplicatePolicy, FragmentBuffer, IncompleteEventDiscarded, InsertError};
pub use config::{ConfigError, StreamerConfig};
pub use event::Event;
pub use extractor::EventExtractor;
pub use fragment::{EventId, Fragment, FragmentError, FragmentHeader, FragmentIndex};
pub use input::{EventSource, FragmentInput};
pub use metrics::{EVENTS_TOTAL, FRAGMENTS_ACCEPTED, FRAGMENTS_REJECTED, PARTIAL_EVENTS};
pub use pipeline::Streamer;
pub use queue::{BoundedEventQueue, OverflowPolicy, PushError};
pub use stats::{StatsSnapshot, StreamStats};
