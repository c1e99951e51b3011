use serde::{Deserialize, Serialize};

use super::{EventId, FragmentError, FragmentIndex};

/// Header describing a single fragment.
///
/// The header is decoded by the upstream transport; it carries just enough
/// information to place the fragment inside its event and to tell when the
/// event is complete. It is small enough to copy by value.
///
/// # Examples
///
/// ```
/// use streamer::fragment::{EventId, FragmentHeader, FragmentIndex};
/// let header = FragmentHeader::new(EventId::new(7), FragmentIndex::zero(), 2);
/// assert_eq!(header.event_id().get(), 7);
/// assert_eq!(header.fragment_index().get(), 0);
/// assert_eq!(header.fragment_count(), 2);
/// assert!(header.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentHeader {
    event_id: EventId,
    fragment_index: FragmentIndex,
    fragment_count: u32,
}

impl FragmentHeader {
    /// Create a new fragment header.
    ///
    /// The header is not validated here; call [`validate`](Self::validate)
    /// or let the buffer reject it on insert.
    #[must_use]
    pub const fn new(event_id: EventId, fragment_index: FragmentIndex, fragment_count: u32) -> Self {
        Self {
            event_id,
            fragment_index,
            fragment_count,
        }
    }

    /// Return the event identifier.
    #[must_use]
    pub const fn event_id(&self) -> EventId { self.event_id }

    /// Return the fragment position relative to the event.
    #[must_use]
    pub const fn fragment_index(&self) -> FragmentIndex { self.fragment_index }

    /// Return the total number of fragments the event is declared to have.
    #[must_use]
    pub const fn fragment_count(&self) -> u32 { self.fragment_count }

    /// Check the header's internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::ZeroCount`] when the declared count is zero and
    /// [`FragmentError::IndexOutOfRange`] when the index is not below the
    /// declared count.
    pub const fn validate(&self) -> Result<(), FragmentError> {
        if self.fragment_count == 0 {
            return Err(FragmentError::ZeroCount {
                event_id: self.event_id,
            });
        }
        if !self.fragment_index.is_within(self.fragment_count) {
            return Err(FragmentError::IndexOutOfRange {
                event_id: self.event_id,
                index: self.fragment_index,
                count: self.fragment_count,
            });
        }
        Ok(())
    }
}
