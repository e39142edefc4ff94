//! heartbeat-core -- shared types, clock utilities, device priority, and
//! the canonical Arrow schema for the heart-rate ingest-to-parquet
//! pipeline. No I/O, no async: platform-agnostic logic only.

pub mod clock;
pub mod device_priority;
pub mod producer;
pub mod sample;
pub mod schema;

pub use device_priority::{priority_for, SENTINEL_PRIORITY};
pub use producer::build_queue_item;
pub use sample::{now_epoch_ms, QueueItem, Sample, SampleError};
