//! Bounded queues with drop-on-full backpressure and atomic batch drains.
//!
//! The queue's internal lock is the engine's only synchronization point: a
//! submit arriving while a drain holds the lock lands in the current batch
//! or the next one, never both, never neither.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::warn;

pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Fixed-capacity queue shared between producers and one draining worker.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    name: &'static str,
    capacity: usize,
    submit_timeout: Duration,
    retry_interval: Duration,
    items: Mutex<VecDeque<T>>,
}

impl<T> BoundedQueue<T> {
    pub fn new(
        name: &'static str,
        capacity: usize,
        submit_timeout: Duration,
        retry_interval: Duration,
    ) -> Self {
        Self {
            name,
            capacity: capacity.max(1),
            submit_timeout,
            retry_interval,
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Attempts to enqueue within the submit timeout.
    ///
    /// Returns false when the queue stayed full for the whole window; the
    /// item is dropped and the drop logged. This is deliberate backpressure,
    /// not an error surfaced to the producer.
    pub async fn submit(&self, item: T) -> bool {
        let deadline = Instant::now() + self.submit_timeout;
        loop {
            {
                let mut items = lock_unpoisoned(&self.items);
                if items.len() < self.capacity {
                    items.push_back(item);
                    return true;
                }
            }
            if Instant::now() >= deadline {
                warn!(
                    "queue_full_drop: queue={} capacity={}",
                    self.name, self.capacity
                );
                return false;
            }
            tokio::time::sleep(self.retry_interval).await;
        }
    }

    /// Atomically moves every currently queued item into a new batch.
    pub fn drain_batch(&self) -> Vec<T> {
        let mut items = lock_unpoisoned(&self.items);
        items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(capacity: usize) -> BoundedQueue<u32> {
        BoundedQueue::new(
            "test",
            capacity,
            Duration::from_millis(20),
            Duration::from_millis(2),
        )
    }

    #[tokio::test]
    async fn submits_beyond_capacity_are_dropped_after_the_window() {
        let queue = queue(2);
        let mut accepted = 0;
        for value in 0..5u32 {
            if queue.submit(value).await {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 2);
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn drain_batch_preserves_arrival_order_and_empties_the_queue() {
        let queue = queue(8);
        for value in [3u32, 1, 4, 1, 5] {
            assert!(queue.submit(value).await);
        }
        let batch = queue.drain_batch();
        assert_eq!(batch, vec![3, 1, 4, 1, 5]);
        assert!(queue.is_empty());
        assert!(queue.drain_batch().is_empty());
    }

    #[tokio::test]
    async fn capacity_frees_up_after_a_drain() {
        let queue = queue(1);
        assert!(queue.submit(1).await);
        assert!(!queue.submit(2).await);
        queue.drain_batch();
        assert!(queue.submit(3).await);
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped_to_one() {
        let queue = queue(0);
        assert_eq!(queue.capacity(), 1);
        assert!(queue.submit(7).await);
    }
}
