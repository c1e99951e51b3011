//! In-progress event state owned by the fragment buffer.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    time::Instant,
};

use bytes::Bytes;

use super::IncompleteEventDiscarded;
use crate::fragment::{EventId, Fragment, FragmentError, FragmentIndex};

/// Result of offering a fragment to a [`PartialEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceptStatus {
    /// The event still expects more fragments.
    Incomplete,
    /// The fragment filled the last missing slot.
    Complete,
    /// The slot was already filled; the stored payload is unchanged.
    Duplicate,
}

/// Fragments received so far for one event.
///
/// Received payloads are keyed by [`FragmentIndex`]; every key lies in
/// `[0, expected_count)` and the event is complete exactly when all keys in
/// that range are present.
#[derive(Debug)]
pub struct PartialEvent {
    event_id: EventId,
    expected_count: u32,
    received: BTreeMap<FragmentIndex, Bytes>,
    first_seen: Instant,
}

impl PartialEvent {
    pub(crate) fn new(event_id: EventId, expected_count: u32, first_seen: Instant) -> Self {
        Self {
            event_id,
            expected_count,
            received: BTreeMap::new(),
            first_seen,
        }
    }

    /// Identifier of the event under assembly.
    #[must_use]
    pub const fn event_id(&self) -> EventId { self.event_id }

    /// Number of fragments the event declared.
    #[must_use]
    pub const fn expected_count(&self) -> u32 { self.expected_count }

    /// Number of distinct fragments received so far.
    #[must_use]
    pub fn received_count(&self) -> u32 {
        // Keys are bounded by `expected_count`, so the length always fits.
        u32::try_from(self.received.len()).unwrap_or(u32::MAX)
    }

    /// Moment the first fragment of the event arrived.
    #[must_use]
    pub const fn first_seen(&self) -> Instant { self.first_seen }

    /// Report whether every slot in `[0, expected_count)` is filled.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.received_count() == self.expected_count }

    /// Store a fragment if its slot is still empty.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::CountMismatch`] when the fragment declares a
    /// different total than this event and [`FragmentError::IndexOutOfRange`]
    /// when its index does not address a slot.
    pub(crate) fn accept(&mut self, fragment: &Fragment) -> Result<AcceptStatus, FragmentError> {
        let header = fragment.header();
        debug_assert_eq!(header.event_id(), self.event_id, "fragment routed to wrong event");
        if header.fragment_count() != self.expected_count {
            return Err(FragmentError::CountMismatch {
                event_id: self.event_id,
                expected: self.expected_count,
                found: header.fragment_count(),
            });
        }
        header.validate()?;

        match self.received.entry(header.fragment_index()) {
            Entry::Occupied(_) => Ok(AcceptStatus::Duplicate),
            Entry::Vacant(vacant) => {
                vacant.insert(fragment.payload().clone());
                if self.is_complete() {
                    Ok(AcceptStatus::Complete)
                } else {
                    Ok(AcceptStatus::Incomplete)
                }
            }
        }
    }

    pub(crate) fn discard_report(&self) -> IncompleteEventDiscarded {
        IncompleteEventDiscarded {
            event_id: self.event_id,
            received_count: self.received_count(),
            expected_count: self.expected_count,
        }
    }

    /// Consume the partial event, yielding payloads in ascending index order.
    pub(crate) fn into_ordered_payloads(self) -> Vec<Bytes> { self.received.into_values().collect() }
}
