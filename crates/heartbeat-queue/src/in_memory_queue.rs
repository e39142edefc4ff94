//! A Redis-free `DurableQueue` for tests: same reliable-transfer contract
//! (pop moves to an in-flight list, ack removes from it) without a live
//! Redis server.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use heartbeat_core::QueueItem;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::QueueError;
use crate::queue::DurableQueue;

#[derive(Default)]
pub struct InMemoryQueue {
    main: Mutex<VecDeque<Vec<u8>>>,
    in_flight: Mutex<Vec<Vec<u8>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[async_trait]
impl DurableQueue for InMemoryQueue {
    async fn push(&self, item: &QueueItem) -> Result<(), QueueError> {
        let payload = item.to_json_bytes()?;
        self.main.lock().await.push_back(payload);
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Vec<u8>>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(payload) = self.main.lock().await.pop_front() {
                self.in_flight.lock().await.push(payload.clone());
                return Ok(Some(payload));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn ack(&self, payload: &[u8]) -> Result<(), QueueError> {
        let mut in_flight = self.in_flight.lock().await;
        if let Some(pos) = in_flight.iter().position(|p| p.as_slice() == payload) {
            in_flight.remove(pos);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), QueueError> {
        Ok(())
    }
}
