//! Exercises `DurableQueue` the way `heartbeat-server`'s `AppState` and
//! `heartbeat-consumer`'s `ConsumerLoop` actually hold it: behind
//! `Arc<dyn DurableQueue>`, not the concrete `InMemoryQueue` type the
//! inline unit tests use directly.

use std::sync::Arc;
use std::time::Duration;

use heartbeat_core::{now_epoch_ms, QueueItem};
use heartbeat_queue::{DurableQueue, InMemoryQueue};

fn item(device_id: &str) -> QueueItem {
    QueueItem {
        device_id: device_id.into(),
        user_id: "u1".into(),
        timestamp_ms: Some(1_705_315_200_000),
        heart_rate: 70,
        enqueued_at: now_epoch_ms(),
    }
}

#[tokio::test]
async fn trait_object_round_trips_push_pop_ack() {
    let queue: Arc<dyn DurableQueue> = Arc::new(InMemoryQueue::new());

    queue.push(&item("device_a")).await.unwrap();
    queue.push(&item("device_b")).await.unwrap();

    queue.ping().await.unwrap();

    let first = queue.pop(Duration::from_millis(50)).await.unwrap().unwrap();
    let second = queue.pop(Duration::from_millis(50)).await.unwrap().unwrap();

    let decoded_first = QueueItem::from_json_bytes(&first).unwrap();
    assert_eq!(decoded_first.device_id, "device_a");

    queue.ack(&first).await.unwrap();
    queue.ack(&second).await.unwrap();

    let empty = queue.pop(Duration::from_millis(20)).await.unwrap();
    assert!(empty.is_none());
}
