//! heartbeat-storage -- on-disk layout, atomic parquet writes, and
//! canonical-schema normalization shared by the consumer, compactor, and
//! reader.

pub mod atomic_write;
pub mod error;
pub mod layout;
pub mod normalize;
pub mod read;

pub use atomic_write::{atomic_write, writer_properties};
pub use error::StorageError;
pub use layout::{StorageLayout, UserDateDir, COMPACTED_FILE_NAME};
pub use normalize::normalize_to_canonical;
pub use read::read_parquet_file;
