//! The consumer poll loop: pop from the queue, accumulate, flush on size
//! or time threshold, ack what was durably written. Mirrors the shape of
//! the original `consumer_loop` with its two flush conditions and its
//! final drain-on-shutdown behavior.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use heartbeat_core::QueueItem;
use heartbeat_queue::DurableQueue;
use heartbeat_storage::StorageLayout;

use crate::accumulator::BatchAccumulator;
use crate::flush::flush_to_parts;

pub struct ConsumerLoop<Q: DurableQueue + ?Sized> {
    queue: Arc<Q>,
    layout: StorageLayout,
    accumulator: BatchAccumulator,
    brpop_timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<Q: DurableQueue + ?Sized> ConsumerLoop<Q> {
    pub fn new(
        queue: Arc<Q>,
        layout: StorageLayout,
        max_batch: usize,
        max_batch_time: Duration,
        brpop_timeout: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            queue,
            layout,
            accumulator: BatchAccumulator::new(max_batch, max_batch_time),
            brpop_timeout,
            shutdown,
        }
    }

    /// Runs until `shutdown` is set, then flushes whatever remains so a
    /// graceful stop never silently drops buffered samples.
    pub async fn run(&self) {
        tracing::info!("consumer loop started");
        while !self.shutdown.load(Ordering::Relaxed) {
            self.tick().await;
        }
        tracing::info!("shutdown requested, flushing remaining batch");
        self.flush_now().await;
    }

    async fn tick(&self) {
        match self.queue.pop(self.brpop_timeout).await {
            Ok(Some(raw)) => self.handle_raw(raw).await,
            Ok(None) => {
                if self.accumulator.should_flush_on_time() {
                    self.flush_now().await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "queue pop failed, backing off");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    async fn handle_raw(&self, raw: Vec<u8>) {
        match QueueItem::from_json_bytes(&raw) {
            Ok(item) => {
                if self.accumulator.push(raw, item) {
                    self.flush_now().await;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping corrupt queue item");
                if let Err(ack_err) = self.queue.ack(&raw).await {
                    tracing::error!(error = %ack_err, "failed to remove corrupt item from processing list");
                }
            }
        }
    }

    async fn flush_now(&self) {
        if self.accumulator.is_empty() {
            return;
        }
        let pending = self.accumulator.take_all();
        let acked = flush_to_parts(&self.layout, pending);
        for raw in acked {
            if let Err(e) = self.queue.ack(&raw).await {
                tracing::error!(error = %e, "failed to ack written item");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartbeat_core::{now_epoch_ms, Sample};
    use heartbeat_queue::InMemoryQueue;

    #[tokio::test]
    async fn flushes_on_max_batch_and_acks_written_items() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));
        let queue = Arc::new(InMemoryQueue::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let sample = Sample::from_wire("device_a".into(), "u1".into(), "2025-01-15T10:00:00Z", 70).unwrap();
        let item = QueueItem::from_sample(&sample, now_epoch_ms());
        queue.push(&item).await.unwrap();
        queue.push(&item).await.unwrap();

        let consumer = ConsumerLoop::new(queue.clone(), layout.clone(), 2, Duration::from_secs(60), Duration::from_millis(20), shutdown);
        consumer.tick().await;
        consumer.tick().await;

        let parts = layout.list_part_files("u1", "2025-01-15").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(queue.in_flight_len().await, 0);
    }

    #[tokio::test]
    async fn shutdown_flushes_a_partial_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path().join("data"), tmp.path().join("archive"));
        let queue = Arc::new(InMemoryQueue::new());
        let shutdown = Arc::new(AtomicBool::new(true));

        let sample = Sample::from_wire("device_a".into(), "u1".into(), "2025-01-15T10:00:00Z", 70).unwrap();
        let item = QueueItem::from_sample(&sample, now_epoch_ms());
        queue.push(&item).await.unwrap();

        let consumer = ConsumerLoop::new(queue.clone(), layout.clone(), 400, Duration::from_secs(60), Duration::from_millis(20), shutdown);
        consumer.tick().await;
        consumer.run().await;

        let parts = layout.list_part_files("u1", "2025-01-15").unwrap();
        assert_eq!(parts.len(), 1);
    }
}
