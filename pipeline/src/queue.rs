//! Bounded FIFO between the directory watcher and the registrar.
//!
//! The queue has a fixed capacity. [`QueueSender::enqueue`] waits while the
//! queue is full instead of dropping or growing, so a slow registrar stalls
//! the producer all the way back to the notify thread. Closing the sender
//! lets the receiver drain what is buffered before it observes the end.

use thiserror::Error;
use tokio::sync::mpsc;

/// Default number of slots.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Errors returned by work queue operations.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// A queue needs at least one slot.
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    /// The receiving side is gone; the item was not queued.
    #[error("queue is closed")]
    Closed,
}

/// Create a bounded queue with `capacity` slots.
pub fn work_queue<T>(
    capacity: usize,
) -> std::result::Result<(QueueSender<T>, QueueReceiver<T>), QueueError> {
    if capacity == 0 {
        return Err(QueueError::ZeroCapacity);
    }

    let (tx, rx) = mpsc::channel(capacity);
    Ok((QueueSender { tx }, QueueReceiver { rx }))
}

/// Producing half of a work queue.
#[derive(Debug)]
pub struct QueueSender<T> {
    tx: mpsc::Sender<T>,
}

impl<T> QueueSender<T> {
    /// Append an item, waiting for a free slot if the queue is full.
    pub async fn enqueue(&self, item: T) -> std::result::Result<(), QueueError> {
        self.tx.send(item).await.map_err(|_| QueueError::Closed)
    }

    /// Close the queue. Buffered items remain available to the receiver.
    pub fn close(self) {}

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the receiver was dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consuming half of a work queue.
#[derive(Debug)]
pub struct QueueReceiver<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> QueueReceiver<T> {
    /// Remove the oldest item, waiting while the queue is empty.
    ///
    /// Returns `None` once the sender is closed and every buffered item has
    /// been taken.
    pub async fn dequeue(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
