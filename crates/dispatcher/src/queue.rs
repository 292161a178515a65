//! BoundedQueue - fixed-capacity FIFO between callers and the worker
//!
//! Many producers, one consumer. The lock is never held across an await.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

const PREALLOCATE_LIMIT: usize = 1024;

/// Fixed-capacity FIFO that drops incoming items when full
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
    available: Notify,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue holding at most `capacity` items
    ///
    /// Storage grows on demand; only a small head start is preallocated.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT))),
            capacity,
            available: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Append `item` unless the queue is full (non-blocking)
    ///
    /// Returns false if the item was discarded.
    pub fn try_enqueue(&self, item: T) -> bool {
        {
            let mut items = self.items();
            if items.len() >= self.capacity {
                return false;
            }
            items.push_back(item);
        }
        self.available.notify_one();
        true
    }

    /// Wait until an item is present, then remove and return the oldest
    ///
    /// Single consumer only.
    pub async fn dequeue(&self) -> T {
        loop {
            let next = self.items().pop_front();
            if let Some(item) = next {
                return item;
            }
            self.available.notified().await;
        }
    }

    /// Remove every present item, oldest first, up to `max` if given
    pub fn drain_available(&self, max: Option<usize>) -> Vec<T> {
        let mut items = self.items();
        let count = max.map_or(items.len(), |max| max.min(items.len()));
        items.drain(..count).collect()
    }

    /// Put a batch back at the head of the queue, keeping its order
    ///
    /// Capacity still holds afterwards: the newest items are discarded to make
    /// room. Returns how many were discarded.
    pub fn requeue_front(&self, batch: Vec<T>) -> usize {
        let mut items = self.items();
        for item in batch.into_iter().rev() {
            items.push_front(item);
        }
        let overflow = items.len().saturating_sub(self.capacity);
        items.truncate(self.capacity);
        overflow
    }

    fn items(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
