use std::sync::Arc;

use heartbeat_queue::DurableQueue;
use heartbeat_storage::StorageLayout;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn DurableQueue>,
    pub layout: Arc<StorageLayout>,
}
