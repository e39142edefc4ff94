//! Redis-backed `DurableQueue`, using `BLMOVE` (the non-deprecated
//! successor to `BRPOPLPUSH`) to atomically move items from the main
//! queue list into a processing list, and `LREM` to acknowledge them.

use std::time::Duration;

use async_trait::async_trait;
use heartbeat_config::QueueConfig;
use heartbeat_core::QueueItem;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Direction};

use crate::error::QueueError;
use crate::queue::DurableQueue;

pub struct RedisQueue {
    manager: ConnectionManager,
    queue_key: String,
    processing_key: String,
}

impl RedisQueue {
    pub async fn connect(config: &QueueConfig) -> Result<Self, QueueError> {
        let client = redis::Client::open(config.url.as_str())?;
        let manager = client.get_connection_manager().await?;
        Ok(Self {
            manager,
            queue_key: config.queue_key.clone(),
            processing_key: config.processing_key.clone(),
        })
    }
}

#[async_trait]
impl DurableQueue for RedisQueue {
    async fn push(&self, item: &QueueItem) -> Result<(), QueueError> {
        let payload = item.to_json_bytes()?;
        let mut conn = self.manager.clone();
        let _: () = conn.lpush(&self.queue_key, payload).await?;
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<Vec<u8>>, QueueError> {
        let mut conn = self.manager.clone();
        let item: Option<Vec<u8>> = conn
            .blmove(
                &self.queue_key,
                &self.processing_key,
                Direction::Right,
                Direction::Left,
                timeout.as_secs_f64(),
            )
            .await?;
        Ok(item)
    }

    async fn ack(&self, payload: &[u8]) -> Result<(), QueueError> {
        let mut conn = self.manager.clone();
        let _: i64 = conn.lrem(&self.processing_key, 1, payload).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), QueueError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
