use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Identifier shared by every fragment of one event.
///
/// # Examples
///
/// ```
/// use streamer::fragment::EventId;
/// let id = EventId::new(42);
/// assert_eq!(id.get(), 42);
/// ```
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into, Serialize, Deserialize,
)]
#[display("{_0}")]
pub struct EventId(u64);

impl EventId {
    /// Create a new identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self { Self(value) }

    /// Return the inner numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }
}
