//! Tests for staleness eviction, shutdown, and end-of-input signalling.

use std::{thread, time::Duration};

use rstest::{fixture, rstest};
use streamer::{
    EventId,
    EventSource,
    IncompleteEventDiscarded,
    InsertError,
    Streamer,
    StreamerConfig,
};
use streamer_testing::split_event;

#[fixture]
fn pipeline() -> Streamer {
    Streamer::new(StreamerConfig {
        queue_capacity: 4,
        ..StreamerConfig::default()
    })
    .expect("valid config")
}

#[rstest]
fn shutdown_drains_queued_events_in_completion_order(pipeline: Streamer) {
    let assembler = pipeline.assembler();
    for id in [30, 10, 20] {
        for fragment in split_event(id, b"payload", 3) {
            assembler.insert_blocking(fragment).expect("fragment accepted");
        }
    }

    pipeline.shutdown();
    let mut input = pipeline.input();
    let order: Vec<u64> = std::iter::from_fn(|| input.read())
        .map(|event| event.event_id().get())
        .collect();
    assert_eq!(order, vec![30, 10, 20]);
    assert!(input.read().is_none(), "end of input is permanent");
    assert!(input.is_exhausted());
}

#[rstest]
fn shutdown_discards_partials_and_rejects_new_fragments(pipeline: Streamer) {
    let assembler = pipeline.assembler();
    let mut fragments = split_event(5, b"abc", 1);
    let missing = fragments.pop().expect("three fragments");
    for fragment in fragments {
        assembler.insert_blocking(fragment).expect("fragment accepted");
    }

    let discarded = pipeline.shutdown();
    assert_eq!(
        discarded,
        vec![IncompleteEventDiscarded {
            event_id: EventId::new(5),
            received_count: 2,
            expected_count: 3,
        }]
    );
    assert_eq!(
        assembler.insert_blocking(missing),
        Err(InsertError::Closed {
            event_id: EventId::new(5)
        })
    );
    assert!(pipeline.input().next().is_none(), "partial event never surfaces");
}

#[rstest]
fn shutdown_wakes_idle_consumers(pipeline: Streamer) {
    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let mut input = pipeline.input();
            thread::spawn(move || input.read().is_none())
        })
        .collect();
    thread::sleep(Duration::from_millis(20));

    pipeline.shutdown();
    for consumer in consumers {
        assert!(consumer.join().expect("consumer thread panicked"));
    }
}

#[test]
fn stale_partial_event_is_evicted_without_reaching_consumers() {
    let pipeline = Streamer::new(StreamerConfig {
        staleness_window_ms: 10,
        ..StreamerConfig::default()
    })
    .expect("valid config");
    let assembler = pipeline.assembler();
    let first = split_event(2, b"xy", 1).swap_remove(0);
    assembler.insert_blocking(first).expect("fragment accepted");

    thread::sleep(Duration::from_millis(25));
    let discarded = assembler.purge_expired();
    assert_eq!(
        discarded,
        vec![IncompleteEventDiscarded {
            event_id: EventId::new(2),
            received_count: 1,
            expected_count: 2,
        }]
    );

    assert!(pipeline.shutdown().is_empty());
    assert!(pipeline.input().next().is_none());
    let stats = pipeline.stats();
    assert_eq!(stats.events_discarded, 1);
    assert_eq!(stats.events_completed, 0);
}
