use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("storage error: {0}")]
    Storage(#[from] heartbeat_storage::StorageError),
}
