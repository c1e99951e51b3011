//! Shared constructors for unit tests.

use std::time::Instant;

use bytes::Bytes;

use crate::{
    event::Event,
    fragment::{EventId, Fragment, FragmentIndex},
};

/// Build a fragment from plain integers.
pub fn fragment(event_id: u64, index: u32, count: u32, payload: &[u8]) -> Fragment {
    Fragment::new(
        EventId::new(event_id),
        FragmentIndex::new(index),
        count,
        Bytes::copy_from_slice(payload),
    )
}

/// Split `payloads` into one fragment per entry, in index order.
pub fn fragments_of<P: AsRef<[u8]>>(event_id: u64, payloads: &[P]) -> Vec<Fragment> {
    let count = u32::try_from(payloads.len()).expect("test payload count fits in u32");
    payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            let index = u32::try_from(index).expect("test index fits in u32");
            fragment(event_id, index, count, payload.as_ref())
        })
        .collect()
}

/// Build a single-payload event directly.
pub fn event(event_id: u64) -> Event {
    Event::new(
        EventId::new(event_id),
        vec![Bytes::copy_from_slice(&event_id.to_be_bytes())],
        Instant::now(),
    )
}
