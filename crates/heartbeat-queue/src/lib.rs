//! heartbeat-queue -- the durable at-least-once queue the producer writes
//! to and the consumer drains, plus an in-memory double for tests.

pub mod error;
pub mod in_memory_queue;
pub mod queue;
pub mod redis_queue;

pub use error::QueueError;
pub use in_memory_queue::InMemoryQueue;
pub use queue::DurableQueue;
pub use redis_queue::RedisQueue;
