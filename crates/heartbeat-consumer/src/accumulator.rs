//! The in-memory pending batch shared between the poll loop and the
//! flush path. One accumulator serves the whole consumer; items for
//! every user/date land in the same buffer until a size or time
//! threshold triggers a flush that groups them by destination.

use std::time::{Duration, Instant};

use heartbeat_core::QueueItem;
use parking_lot::Mutex;

pub struct PendingItem {
    pub raw: Vec<u8>,
    pub item: QueueItem,
}

pub struct BatchAccumulator {
    max_batch: usize,
    max_batch_time: Duration,
    inner: Mutex<Inner>,
}

struct Inner {
    pending: Vec<PendingItem>,
    last_flush: Instant,
}

impl BatchAccumulator {
    pub fn new(max_batch: usize, max_batch_time: Duration) -> Self {
        Self {
            max_batch,
            max_batch_time,
            inner: Mutex::new(Inner {
                pending: Vec::new(),
                last_flush: Instant::now(),
            }),
        }
    }

    /// Adds an item and reports whether a flush condition is now met
    /// (batch full, or the max-age clock has elapsed).
    pub fn push(&self, raw: Vec<u8>, item: QueueItem) -> bool {
        let mut guard = self.inner.lock();
        guard.pending.push(PendingItem { raw, item });
        guard.pending.len() >= self.max_batch || guard.last_flush.elapsed() >= self.max_batch_time
    }

    /// True when items are waiting and the max-age clock has elapsed,
    /// even though nothing new has arrived to trigger a flush on `push`.
    pub fn should_flush_on_time(&self) -> bool {
        let guard = self.inner.lock();
        !guard.pending.is_empty() && guard.last_flush.elapsed() >= self.max_batch_time
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().pending.is_empty()
    }

    /// Drains all pending items and resets the flush clock.
    pub fn take_all(&self) -> Vec<PendingItem> {
        let mut guard = self.inner.lock();
        guard.last_flush = Instant::now();
        std::mem::take(&mut guard.pending)
    }
}
