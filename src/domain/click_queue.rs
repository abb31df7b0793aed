//! Bounded in-process queue decoupling ingestion from persistence.
//!
//! [`ClickQueue`] wraps the sending half of a bounded [`tokio::sync::mpsc`]
//! channel. Request handlers enqueue without ever waiting; the single
//! consumer is the click batcher, which owns the receiving half. A full
//! or closed channel rejects the event, which callers interpret as the
//! signal to take the synchronous fallback insert.

use tokio::sync::mpsc;

use super::ClickEvent;

/// Cloneable producer handle for the bounded click queue.
#[derive(Debug, Clone)]
pub struct ClickQueue {
    sender: mpsc::Sender<ClickEvent>,
}

impl ClickQueue {
    /// Creates a queue with the given capacity and returns the producer
    /// handle together with the consumer end for the batcher.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ClickEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Attempts to enqueue an event without blocking.
    ///
    /// Returns `false` when the buffer is at capacity or the batcher has
    /// stopped accepting events (shutdown). Never waits and never
    /// displaces already-queued events.
    pub fn enqueue(&self, event: ClickEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("click queue is full, falling back to synchronous insert");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("click queue is closed, falling back to synchronous insert");
                false
            }
        }
    }

    /// Current number of buffered events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    /// Whether the buffer is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
