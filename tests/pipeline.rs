//! End-to-end tests driving the pipeline with real producer and consumer
//! threads.

use std::{
    collections::HashSet,
    sync::{Arc, Barrier},
    thread,
    time::Duration,
};

use rstest::rstest;
use streamer::{
    EventId,
    EventSource,
    InsertError,
    InsertOutcome,
    OverflowPolicy,
    Streamer,
    StreamerConfig,
};
use streamer_testing::{scrambled, split_event};

fn payload_for(event_id: u64, len: usize) -> Vec<u8> {
    (0..len).map(|i| (event_id as usize + i).to_le_bytes()[0]).collect()
}

#[rstest]
#[case::single_consumer(1)]
#[case::several_consumers(3)]
fn concurrent_producers_deliver_every_event_once(#[case] consumers: usize) {
    const PRODUCERS: u64 = 4;
    const EVENTS: u64 = 50;
    const PAYLOAD: usize = 40;
    const CHUNK: usize = 7;

    let streamer = Streamer::new(StreamerConfig {
        queue_capacity: 4,
        ..StreamerConfig::default()
    })
    .expect("valid config");

    let readers: Vec<_> = (0..consumers)
        .map(|_| {
            let extractor = streamer.extractor();
            thread::spawn(move || {
                let mut events = Vec::new();
                while let Some(event) = extractor.extract() {
                    events.push(event);
                }
                events
            })
        })
        .collect();

    let barrier = Arc::new(Barrier::new(PRODUCERS as usize));
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let assembler = streamer.assembler();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for n in 0..EVENTS {
                    let id = producer * EVENTS + n;
                    let fragments = split_event(id, &payload_for(id, PAYLOAD), CHUNK);
                    for fragment in scrambled(fragments, id) {
                        assembler.insert_blocking(fragment).expect("fragment accepted");
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer thread panicked");
    }
    assert!(streamer.shutdown().is_empty(), "no event left incomplete");

    let events: Vec<_> = readers
        .into_iter()
        .flat_map(|reader| reader.join().expect("consumer thread panicked"))
        .collect();
    assert_eq!(events.len() as u64, PRODUCERS * EVENTS);

    let mut seen = HashSet::new();
    for event in &events {
        let id = event.event_id().get();
        assert!(seen.insert(id), "event {id} delivered twice");
        assert_eq!(event.fragment_count(), PAYLOAD.div_ceil(CHUNK));
        assert_eq!(event.concat().as_ref(), payload_for(id, PAYLOAD).as_slice());
    }

    let stats = streamer.stats();
    assert_eq!(stats.events_completed, PRODUCERS * EVENTS);
    assert_eq!(stats.events_extracted, PRODUCERS * EVENTS);
    assert_eq!(stats.events_lost(), 0);
}

#[test]
fn competing_producers_on_one_event_complete_it_once() {
    const FRAGMENTS: usize = 16;

    let streamer = Streamer::new(StreamerConfig::default()).expect("valid config");
    let fragments = split_event(99, &[7; FRAGMENTS], 1);
    let barrier = Arc::new(Barrier::new(FRAGMENTS));

    let workers: Vec<_> = fragments
        .into_iter()
        .map(|fragment| {
            let assembler = streamer.assembler();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                assembler.insert_blocking(fragment).expect("fragment accepted")
            })
        })
        .collect();
    let queued = workers
        .into_iter()
        .map(|worker| worker.join().expect("producer thread panicked"))
        .filter(|outcome| matches!(outcome, InsertOutcome::Queued { .. }))
        .count();
    assert_eq!(queued, 1);

    streamer.shutdown();
    let mut input = streamer.input();
    let event = input.read().expect("event delivered");
    assert_eq!(event.fragment_count(), FRAGMENTS);
    assert!(input.read().is_none());
}

#[test]
fn late_duplicate_of_delivered_event_is_rejected() {
    let streamer = Streamer::new(StreamerConfig::default()).expect("valid config");
    let assembler = streamer.assembler();
    let mut fragments = split_event(1, b"ab", 1);
    let late = fragments[1].clone();
    fragments.reverse();

    for fragment in fragments {
        assembler.insert_blocking(fragment).expect("fragment accepted");
    }
    let event = streamer.extractor().try_extract().expect("event ready");
    let payloads: Vec<&[u8]> = event.payloads().iter().map(AsRef::as_ref).collect();
    assert_eq!(payloads, vec![&b"a"[..], &b"b"[..]]);

    let err = assembler
        .insert_blocking(late)
        .expect_err("duplicate rejected");
    assert!(matches!(err, InsertError::Duplicate { event_id, .. } if event_id == EventId::new(1)));
    assert!(streamer.extractor().try_extract().is_none());
    assert_eq!(streamer.stats().duplicate_fragments, 1);
}

#[test]
fn drop_policy_keeps_producers_moving() {
    let streamer = Streamer::new(StreamerConfig {
        queue_capacity: 2,
        overflow_policy: OverflowPolicy::Drop,
        ..StreamerConfig::default()
    })
    .expect("valid config");
    let assembler = streamer.assembler();

    let outcomes: Vec<_> = (0..5)
        .flat_map(|id| split_event(id, b"x", 1))
        .map(|fragment| assembler.insert_blocking(fragment).expect("fragment accepted"))
        .collect();
    let dropped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, InsertOutcome::Dropped { .. }))
        .count();
    assert_eq!(dropped, 3);

    streamer.shutdown();
    let delivered: Vec<u64> = streamer.input().map(|event| event.event_id().get()).collect();
    assert_eq!(delivered, vec![0, 1]);
    assert_eq!(streamer.stats().events_dropped, 3);
}

#[test]
fn block_policy_applies_back_pressure_to_producers() {
    let streamer = Streamer::new(StreamerConfig {
        queue_capacity: 1,
        ..StreamerConfig::default()
    })
    .expect("valid config");
    let assembler = streamer.assembler();
    for fragment in split_event(1, b"first", 8) {
        assembler.insert_blocking(fragment).expect("fragment accepted");
    }

    let producer = thread::spawn(move || {
        split_event(2, b"second", 8)
            .into_iter()
            .map(|fragment| assembler.insert_blocking(fragment).expect("fragment accepted"))
            .last()
    });
    thread::sleep(Duration::from_millis(30));
    assert!(!producer.is_finished(), "producer waits while the queue is full");

    let extractor = streamer.extractor();
    assert_eq!(extractor.extract().map(|e| e.event_id().get()), Some(1));
    let outcome = producer.join().expect("producer thread panicked");
    assert_eq!(
        outcome,
        Some(InsertOutcome::Queued {
            event_id: EventId::new(2)
        })
    );
    assert_eq!(extractor.extract().map(|e| e.event_id().get()), Some(2));
}
