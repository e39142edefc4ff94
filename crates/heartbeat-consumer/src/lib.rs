//! heartbeat-consumer -- drains the durable queue into `part-*.parquet`
//! files, batching by size or age and grouping by `(user_id, date)`.

pub mod accumulator;
pub mod error;
pub mod flush;
pub mod run;

pub use accumulator::BatchAccumulator;
pub use error::ConsumerError;
pub use run::ConsumerLoop;
