//! Builders for fragment sequences in realistic arrival orders.

use bytes::Bytes;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use streamer::{EventId, Fragment, FragmentIndex};

/// Split `payload` into fragments of at most `chunk` bytes, in index order.
///
/// An empty payload still yields one empty fragment so the event can
/// complete.
///
/// # Panics
///
/// Panics if `chunk` is zero or the payload needs more than `u32::MAX`
/// fragments.
#[must_use]
pub fn split_event(event_id: u64, payload: &[u8], chunk: usize) -> Vec<Fragment> {
    assert!(chunk > 0, "chunk size must be positive");
    let payload = Bytes::copy_from_slice(payload);
    let count = payload.len().div_ceil(chunk).max(1);
    let count_u32 = u32::try_from(count).expect("too many fragments");
    (0..count)
        .map(|index| {
            let start = (index * chunk).min(payload.len());
            let end = (start + chunk).min(payload.len());
            Fragment::new(
                EventId::new(event_id),
                FragmentIndex::try_from(index).expect("index fits in u32"),
                count_u32,
                payload.slice(start..end),
            )
        })
        .collect()
}

/// Deterministically shuffle `items` using `seed`.
///
/// The same seed always yields the same order, so failures reproduce.
#[must_use]
pub fn scrambled<T>(mut items: Vec<T>, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    items
}
