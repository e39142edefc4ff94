//! heartbeat-reader -- the query engine: reads compacted + part files for
//! a user/date range, dedups, resolves device priority, and aggregates to
//! one row per device per minute.

pub mod error;
mod pipeline;
mod query;

pub use error::ReaderError;
pub use pipeline::OutputRow;
pub use query::{query_heart_rate, QueryParams};
