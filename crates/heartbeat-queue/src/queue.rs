//! The durable-queue trait every consumer drains from.

use std::time::Duration;

use async_trait::async_trait;
use heartbeat_core::QueueItem;

use crate::error::QueueError;

/// An at-least-once work queue backed by a reliable-transfer move: `pop`
/// atomically relocates an item into an in-flight list, and `ack` removes
/// it only once the consumer has durably written it. A consumer that dies
/// mid-batch leaves its items sitting in the in-flight list for recovery
/// rather than losing them (spec invariant I1).
#[async_trait]
pub trait DurableQueue: Send + Sync {
    async fn push(&self, item: &QueueItem) -> Result<(), QueueError>;

    /// Blocks up to `timeout` for an item, returning its raw payload.
    /// `None` means the timeout elapsed with nothing to process.
    async fn pop(&self, timeout: Duration) -> Result<Option<Vec<u8>>, QueueError>;

    /// Removes one in-flight copy of `payload`. Idempotent: acking a
    /// payload not currently in-flight is not an error.
    async fn ack(&self, payload: &[u8]) -> Result<(), QueueError>;

    /// Liveness probe used by the `/health` endpoint.
    async fn ping(&self) -> Result<(), QueueError>;
}
