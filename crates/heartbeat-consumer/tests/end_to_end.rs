//! Drives the full pipeline purely in-process: push samples onto an
//! `InMemoryQueue`, let the consumer drain and flush them to part files,
//! compact those parts, then query the result -- exercising P1 and P6
//! end-to-end without a live Redis or a real clock dependency on wall time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use heartbeat_consumer::ConsumerLoop;
use heartbeat_core::{now_epoch_ms, Sample};
use heartbeat_queue::InMemoryQueue;
use heartbeat_reader::{query_heart_rate, QueryParams};
use heartbeat_storage::StorageLayout;

#[tokio::test]
async fn push_through_consumer_compactor_and_reader() {
    let tmp = tempfile::tempdir().unwrap();
    let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));
    let queue = Arc::new(InMemoryQueue::new());

    for ts in ["2025-01-15T10:00:10Z", "2025-01-15T10:00:30Z", "2025-01-15T10:00:50Z"] {
        let sample = Sample::from_wire("device_a".into(), "u1".into(), ts, 60).unwrap();
        let item = heartbeat_core::QueueItem::from_sample(&sample, now_epoch_ms());
        queue.push(&item).await.unwrap();
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let consumer = ConsumerLoop::new(
        queue.clone(),
        layout.clone(),
        3,
        Duration::from_secs(60),
        Duration::from_millis(20),
        shutdown.clone(),
    );

    let handle = tokio::spawn(async move { consumer.run().await });
    // The size-triggered flush fires as soon as the third item is popped;
    // give the polling pop loop a little room to drain the queue.
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.store(true, Ordering::Relaxed);
    handle.await.unwrap();

    assert_eq!(queue.in_flight_len().await, 0);
    let parts = layout.list_part_files("u1", "2025-01-15").unwrap();
    assert_eq!(parts.len(), 1);

    let outcome = heartbeat_compactor::merge_parts(&layout, "u1", "2025-01-15").unwrap();
    assert_eq!(outcome.rows_written, 1);
    assert_eq!(outcome.parts_archived, 1);

    let params = QueryParams {
        user_id: "u1",
        start_ms: Sample::from_wire("device_a".into(), "u1".into(), "2025-01-15T10:00:00Z", 60)
            .unwrap()
            .timestamp_ms,
        end_ms: Sample::from_wire("device_a".into(), "u1".into(), "2025-01-15T10:01:00Z", 60)
            .unwrap()
            .timestamp_ms,
        device_id: None,
    };
    let rows = query_heart_rate(&layout, &params).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].device_id, "device_a");
    assert_eq!(rows[0].heart_rate, 60);
    assert_eq!(rows[0].timestamp, "2025-01-15T10:00:00Z");
}
