//! Tests for fragment header accessors and validation rules.

use rstest::rstest;

use crate::fragment::*;

#[test]
fn fragment_header_exposes_fields() {
    let header = FragmentHeader::new(EventId::new(9), FragmentIndex::new(2), 3);
    assert_eq!(header.event_id(), EventId::new(9));
    assert_eq!(header.fragment_index(), FragmentIndex::new(2));
    assert_eq!(header.fragment_count(), 3);
}

#[rstest]
#[case(0, 1)]
#[case(0, 2)]
#[case(4, 5)]
fn header_within_declared_count_is_valid(#[case] index: u32, #[case] count: u32) {
    let header = FragmentHeader::new(EventId::new(1), FragmentIndex::new(index), count);
    assert_eq!(header.validate(), Ok(()));
}

#[test]
fn header_with_zero_count_is_malformed() {
    let header = FragmentHeader::new(EventId::new(5), FragmentIndex::zero(), 0);
    assert_eq!(
        header.validate(),
        Err(FragmentError::ZeroCount {
            event_id: EventId::new(5)
        })
    );
}

#[rstest]
#[case(2, 2)]
#[case(3, 2)]
#[case(u32::MAX, 1)]
fn header_index_at_or_beyond_count_is_malformed(#[case] index: u32, #[case] count: u32) {
    let header = FragmentHeader::new(EventId::new(6), FragmentIndex::new(index), count);
    let err = header
        .validate()
        .expect_err("index outside the declared count must be rejected");
    assert_eq!(
        err,
        FragmentError::IndexOutOfRange {
            event_id: EventId::new(6),
            index: FragmentIndex::new(index),
            count,
        }
    );
}

#[test]
fn fragment_into_parts_returns_header_and_payload() {
    let fragment = Fragment::new(EventId::new(2), FragmentIndex::new(1), 2, vec![1_u8, 2]);
    assert_eq!(fragment.event_id(), EventId::new(2));
    assert_eq!(fragment.fragment_index(), FragmentIndex::new(1));

    let (header, payload) = fragment.into_parts();
    assert_eq!(header.fragment_count(), 2);
    assert_eq!(payload.as_ref(), &[1, 2]);
}

#[test]
fn malformed_errors_render_event_context() {
    let err = FragmentError::CountMismatch {
        event_id: EventId::new(8),
        expected: 2,
        found: 3,
    };
    assert_eq!(
        err.to_string(),
        "event 8: fragment count 3 disagrees with expected 2"
    );
}
