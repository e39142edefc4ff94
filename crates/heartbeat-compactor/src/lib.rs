//! heartbeat-compactor -- periodically folds part-*.parquet files into
//! compacted.parquet, resolving device-priority ties at each exact
//! timestamp and archiving consumed parts.

pub mod error;
pub mod merge;
pub mod run;

pub use error::CompactorError;
pub use merge::{merge_parts, MergeOutcome};
pub use run::run;
