//! Tests for queue ordering, overflow policies, and close semantics.

use std::{sync::Arc, thread};

use futures::FutureExt;
use rstest::{fixture, rstest};

use super::*;
use crate::{fragment::EventId, test_helpers::event};

#[fixture]
fn blocking_queue() -> BoundedEventQueue {
    BoundedEventQueue::builder()
        .capacity(1)
        .overflow_policy(OverflowPolicy::Block)
        .build()
        .expect("failed to build queue")
}

#[fixture]
fn dropping_queue() -> BoundedEventQueue {
    BoundedEventQueue::builder()
        .capacity(1)
        .overflow_policy(OverflowPolicy::Drop)
        .build()
        .expect("failed to build queue")
}

#[rstest]
#[case(0)]
#[case(MAX_QUEUE_CAPACITY + 1)]
fn builder_rejects_invalid_capacity(#[case] capacity: usize) {
    let err = BoundedEventQueue::builder()
        .capacity(capacity)
        .build()
        .expect_err("capacity must be validated");
    assert_eq!(err, QueueConfigError::InvalidCapacity(capacity));
}

#[tokio::test]
async fn events_leave_in_push_order() {
    let queue = BoundedEventQueue::builder()
        .capacity(4)
        .build()
        .expect("failed to build queue");
    for id in [7, 3, 5] {
        queue.push(event(id)).await.expect("push failed");
    }
    assert_eq!(queue.len(), 3);

    let mut order = Vec::new();
    while let Some(event) = queue.try_pop() {
        order.push(event.event_id().get());
    }
    assert_eq!(order, vec![7, 3, 5]);
    assert!(queue.is_empty());
}

#[rstest]
#[tokio::test]
async fn block_policy_suspends_pusher_until_pop(blocking_queue: BoundedEventQueue) {
    blocking_queue.push(event(1)).await.expect("first push failed");

    let mut pending = Box::pin(blocking_queue.push(event(2)));
    assert!(
        (&mut pending).now_or_never().is_none(),
        "push beyond capacity should wait"
    );

    let first = blocking_queue.pop().await.expect("first event");
    assert_eq!(first.event_id(), EventId::new(1));

    pending.await.expect("push should complete after pop");
    let second = blocking_queue.pop().await.expect("second event");
    assert_eq!(second.event_id(), EventId::new(2));
}

#[rstest]
#[tokio::test]
async fn drop_policy_returns_queue_full_without_waiting(dropping_queue: BoundedEventQueue) {
    dropping_queue.push(event(1)).await.expect("first push failed");

    let result = dropping_queue
        .push(event(2))
        .now_or_never()
        .expect("drop policy must not suspend");
    assert_eq!(
        result,
        Err(PushError::QueueFull {
            event_id: EventId::new(2)
        })
    );
    assert_eq!(dropping_queue.len(), 1);
}

#[tokio::test]
async fn close_drains_queued_events_then_ends_stream() {
    let queue = BoundedEventQueue::builder()
        .capacity(4)
        .build()
        .expect("failed to build queue");
    for id in [10, 11, 12] {
        queue.push(event(id)).await.expect("push failed");
    }
    queue.close();

    for id in [10, 11, 12] {
        let drained = queue.pop().await.expect("queued event should drain");
        assert_eq!(drained.event_id(), EventId::new(id));
    }
    assert!(queue.pop().await.is_none());
    assert!(queue.pop().await.is_none(), "end of stream is permanent");
}

#[rstest]
#[tokio::test]
async fn push_after_close_is_rejected(blocking_queue: BoundedEventQueue) {
    blocking_queue.close();
    assert_eq!(
        blocking_queue.push(event(4)).await,
        Err(PushError::Closed {
            event_id: EventId::new(4)
        })
    );
    assert_eq!(
        blocking_queue.try_push(event(5)),
        Err(PushError::Closed {
            event_id: EventId::new(5)
        })
    );
}

#[rstest]
#[tokio::test]
async fn close_wakes_blocked_consumer(blocking_queue: BoundedEventQueue) {
    let consumer = tokio::spawn({
        let queue = blocking_queue.clone();
        async move { queue.pop().await }
    });
    tokio::task::yield_now().await;

    blocking_queue.close();
    let popped = consumer.await.expect("consumer task panicked");
    assert!(popped.is_none());
}

#[rstest]
#[tokio::test]
async fn close_releases_blocked_producer(blocking_queue: BoundedEventQueue) {
    blocking_queue.push(event(1)).await.expect("first push failed");
    let producer = tokio::spawn({
        let queue = blocking_queue.clone();
        async move { queue.push(event(2)).await }
    });
    tokio::task::yield_now().await;

    blocking_queue.close();
    let result = producer.await.expect("producer task panicked");
    assert_eq!(
        result,
        Err(PushError::Closed {
            event_id: EventId::new(2)
        })
    );

    let drained = blocking_queue.pop().await.expect("queued event survives close");
    assert_eq!(drained.event_id(), EventId::new(1));
    assert!(blocking_queue.pop().await.is_none());
}

#[test]
fn concurrent_consumers_receive_each_event_once() {
    const EVENTS: u64 = 200;
    let queue = BoundedEventQueue::builder()
        .capacity(8)
        .build()
        .expect("failed to build queue");
    let queue = Arc::new(queue);

    let consumers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(event) = futures::executor::block_on(queue.pop()) {
                    seen.push(event.event_id().get());
                }
                seen
            })
        })
        .collect();

    for id in 0..EVENTS {
        futures::executor::block_on(queue.push(event(id))).expect("push failed");
    }
    queue.close();

    let mut all: Vec<u64> = consumers
        .into_iter()
        .flat_map(|handle| handle.join().expect("consumer thread panicked"))
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..EVENTS).collect::<Vec<_>>());
}
