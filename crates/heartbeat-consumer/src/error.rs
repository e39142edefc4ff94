use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("storage error: {0}")]
    Storage(#[from] heartbeat_storage::StorageError),
}
