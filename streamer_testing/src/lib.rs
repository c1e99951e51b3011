//! Test fixtures shared by the `streamer` integration tests.
//!
//! The helpers split payloads into fragments, shuffle them into realistic
//! arrival orders, capture log output, and read counters back from a
//! `metrics-util` debugging recorder.
//!
//! ```rust
//! use streamer_testing::{scrambled, split_event};
//!
//! let fragments = split_event(9, b"hello world", 4);
//! assert_eq!(fragments.len(), 3);
//! let shuffled = scrambled(fragments, 7);
//! assert_eq!(shuffled.len(), 3);
//! ```

pub mod fragments;
pub mod logging;
pub mod metrics;

pub use fragments::{scrambled, split_event};
pub use logging::{LoggerHandle, logger};
pub use metrics::{RecordedMetrics, debugging_recorder};
