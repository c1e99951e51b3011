//! Owned fragment carrying a header and its payload bytes.

use bytes::Bytes;

use super::{EventId, FragmentHeader, FragmentIndex};

/// One piece of an event as delivered by an upstream producer.
///
/// Fragments are immutable once created. The payload is stored as
/// [`Bytes`] so producers can hand over slices of larger receive buffers
/// without copying.
///
/// # Examples
///
/// ```
/// use streamer::fragment::{EventId, Fragment, FragmentIndex};
/// let fragment = Fragment::new(EventId::new(3), FragmentIndex::new(1), 2, &b"tail"[..]);
/// assert_eq!(fragment.header().fragment_count(), 2);
/// assert_eq!(fragment.payload().as_ref(), b"tail");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    header: FragmentHeader,
    payload: Bytes,
}

impl Fragment {
    /// Build a fragment from its raw parts.
    #[must_use]
    pub fn new(
        event_id: EventId,
        fragment_index: FragmentIndex,
        fragment_count: u32,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self::from_parts(
            FragmentHeader::new(event_id, fragment_index, fragment_count),
            payload,
        )
    }

    /// Build a fragment from an already decoded header.
    #[must_use]
    pub fn from_parts(header: FragmentHeader, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// Borrow the fragment header.
    #[must_use]
    pub const fn header(&self) -> &FragmentHeader { &self.header }

    /// Borrow the payload bytes.
    #[must_use]
    pub const fn payload(&self) -> &Bytes { &self.payload }

    /// Shorthand for `header().event_id()`.
    #[must_use]
    pub const fn event_id(&self) -> EventId { self.header.event_id() }

    /// Shorthand for `header().fragment_index()`.
    #[must_use]
    pub const fn fragment_index(&self) -> FragmentIndex { self.header.fragment_index() }

    /// Consume the fragment, returning its header and payload.
    #[must_use]
    pub fn into_parts(self) -> (FragmentHeader, Bytes) { (self.header, self.payload) }
}
