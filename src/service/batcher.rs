//! Click batcher: the single consumer of the bounded click queue.
//!
//! Accumulates events into a batch and flushes on batch size, on a
//! periodic timer, and one final time on shutdown. Failed batch inserts
//! are retried with linear backoff; a batch that exhausts all attempts
//! is discarded with an error log and a counter increment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{ClickEvent, ClickQueue};
use crate::error::TrackerError;
use crate::metrics::get_metrics;

/// Default number of events per batch insert.
const DEFAULT_BATCH_SIZE: usize = 100;

/// Default maximum time a non-empty batch waits before flushing.
const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default total insert attempts per batch.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Sink for batched click inserts.
///
/// The seam between the batcher and the persistence gateway; implemented
/// by [`crate::persistence::ClickStore`] and by in-memory doubles in tests.
#[async_trait]
pub trait ClickWriter: Send + Sync {
    /// Persists the batch in a single multi-row insert statement.
    async fn insert_clicks_batch(&self, events: &[ClickEvent]) -> Result<(), TrackerError>;
}

/// Configuration for the click batcher.
#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Number of events that triggers an immediate flush.
    pub batch_size: usize,

    /// Maximum time a non-empty batch waits before a timer flush.
    pub batch_timeout: Duration,

    /// Total insert attempts per batch before it is dropped.
    pub max_retries: u32,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl BatcherConfig {
    /// Overrides the batch size (minimum 1).
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Overrides the batch timeout.
    #[must_use]
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Overrides the total insert attempts per batch (minimum 1).
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries.max(1);
        self
    }
}

/// Single-task consumer that drains the click queue into batched inserts.
pub struct ClickBatcher<W> {
    receiver: mpsc::Receiver<ClickEvent>,
    writer: Arc<W>,
    queue: ClickQueue,
    config: BatcherConfig,
    cancel: CancellationToken,
}

impl<W: ClickWriter + 'static> ClickBatcher<W> {
    /// Creates a new batcher over the consumer end of the click queue.
    ///
    /// `queue` is the producer handle, held only to refresh the queue
    /// occupancy gauge after each flush.
    #[must_use]
    pub fn new(
        receiver: mpsc::Receiver<ClickEvent>,
        writer: Arc<W>,
        queue: ClickQueue,
        config: BatcherConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            writer,
            queue,
            config,
            cancel,
        }
    }

    /// Runs the batcher until cancellation, then drains and flushes once
    /// more. Spawn as a dedicated tokio task.
    pub async fn run(mut self) {
        let mut batch: Vec<ClickEvent> = Vec::with_capacity(self.config.batch_size);
        let mut interval = tokio::time::interval(self.config.batch_timeout);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;

        tracing::info!(
            batch_size = self.config.batch_size,
            batch_timeout_secs = self.config.batch_timeout.as_secs(),
            "click batcher started"
        );

        loop {
            tokio::select! {
                maybe_event = self.receiver.recv() => {
                    match maybe_event {
                        Some(event) => {
                            batch.push(event);
                            if batch.len() >= self.config.batch_size {
                                self.flush(&mut batch).await;
                                interval.reset();
                            }
                        }
                        // All producer handles dropped.
                        None => break,
                    }
                }
                _ = interval.tick() => {
                    if !batch.is_empty() {
                        self.flush(&mut batch).await;
                        interval.reset();
                    }
                }
                () = self.cancel.cancelled() => {
                    tracing::info!("click batcher received shutdown signal");
                    break;
                }
            }
        }

        // Stop accepting new events, then drain what is already buffered.
        self.receiver.close();
        while let Ok(event) = self.receiver.try_recv() {
            batch.push(event);
        }
        if !batch.is_empty() {
            tracing::info!(count = batch.len(), "flushing remaining clicks on shutdown");
            self.flush(&mut batch).await;
        }

        tracing::info!("click batcher stopped");
    }

    /// Flushes the batch with linear-backoff retry, discarding it after
    /// the final failed attempt. The batch is empty on return either way.
    async fn flush(&self, batch: &mut Vec<ClickEvent>) {
        if batch.is_empty() {
            return;
        }
        let count = batch.len();

        for attempt in 0..self.config.max_retries {
            match self.writer.insert_clicks_batch(batch).await {
                Ok(()) => {
                    tracing::debug!(count, "click batch persisted");
                    if let Some(metrics) = get_metrics() {
                        metrics.clicks_processed.inc_by(count as f64);
                        metrics.queue_size.set(self.queue.len() as f64);
                    }
                    batch.clear();
                    return;
                }
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        "failed to insert click batch"
                    );
                    tokio::time::sleep(Duration::from_secs(u64::from(attempt) + 1)).await;
                }
            }
        }

        tracing::error!(count, "dropping click batch after all insert retries failed");
        if let Some(metrics) = get_metrics() {
            metrics.batches_dropped.inc();
            metrics.queue_size.set(self.queue.len() as f64);
        }
        batch.clear();
    }
}

/// Creates the batcher and spawns it as a tokio task, returning the
/// producer handle and the task's join handle.
pub fn spawn_click_batcher<W: ClickWriter + 'static>(
    capacity: usize,
    writer: Arc<W>,
    config: BatcherConfig,
    cancel: CancellationToken,
) -> (ClickQueue, tokio::task::JoinHandle<()>) {
    let (queue, receiver) = ClickQueue::new(capacity);
    let batcher = ClickBatcher::new(receiver, writer, queue.clone(), config, cancel);
    let handle = tokio::spawn(batcher.run());
    (queue, handle)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Records every batch it receives, optionally failing the first
    /// `fail_first` insert attempts.
    #[derive(Default)]
    struct RecordingWriter {
        batches: Mutex<Vec<Vec<i64>>>,
        attempts: Mutex<u32>,
        fail_first: u32,
    }

    impl RecordingWriter {
        fn failing(fail_first: u32) -> Self {
            Self {
                fail_first,
                ..Self::default()
            }
        }

        fn batch_sizes(&self) -> Vec<usize> {
            self.batches
                .lock()
                .map(|b| b.iter().map(Vec::len).collect())
                .unwrap_or_default()
        }

        fn attempts(&self) -> u32 {
            self.attempts.lock().map(|a| *a).unwrap_or(0)
        }
    }

    #[async_trait]
    impl ClickWriter for RecordingWriter {
        async fn insert_clicks_batch(&self, events: &[ClickEvent]) -> Result<(), TrackerError> {
            let attempt = {
                let Ok(mut attempts) = self.attempts.lock() else {
                    panic!("attempts lock poisoned");
                };
                *attempts += 1;
                *attempts
            };
            if attempt <= self.fail_first {
                return Err(TrackerError::StorageUnavailable("injected failure".into()));
            }
            let Ok(mut batches) = self.batches.lock() else {
                panic!("batches lock poisoned");
            };
            batches.push(events.iter().map(|e| e.ad_id).collect());
            Ok(())
        }
    }

    fn sample_event(ad_id: i64) -> ClickEvent {
        ClickEvent::new(ad_id, Utc::now(), "127.0.0.1".into(), 0, "test".into())
    }

    #[tokio::test]
    async fn flush_triggers_on_batch_size() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let config = BatcherConfig::default()
            .with_batch_size(3)
            .with_batch_timeout(Duration::from_secs(60));
        let (queue, handle) =
            spawn_click_batcher(16, Arc::clone(&writer), config, cancel.clone());

        for ad_id in 1..=3 {
            assert!(queue.enqueue(sample_event(ad_id)));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(writer.batch_sizes(), vec![3]);

        cancel.cancel();
        let Ok(()) = handle.await else {
            panic!("batcher task panicked");
        };
    }

    #[tokio::test]
    async fn flush_triggers_on_timer() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let config = BatcherConfig::default()
            .with_batch_size(100)
            .with_batch_timeout(Duration::from_millis(50));
        let (queue, handle) =
            spawn_click_batcher(16, Arc::clone(&writer), config, cancel.clone());

        assert!(queue.enqueue(sample_event(1)));
        assert!(queue.enqueue(sample_event(2)));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(writer.batch_sizes(), vec![2]);

        cancel.cancel();
        let Ok(()) = handle.await else {
            panic!("batcher task panicked");
        };
    }

    #[tokio::test(start_paused = true)]
    async fn timer_flush_resets_the_timer() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let config = BatcherConfig::default()
            .with_batch_size(100)
            .with_batch_timeout(Duration::from_secs(5));
        let (queue, handle) =
            spawn_click_batcher(16, Arc::clone(&writer), config, cancel.clone());

        assert!(queue.enqueue(sample_event(1)));
        assert!(queue.enqueue(sample_event(2)));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(writer.batch_sizes(), vec![2]);

        // An event arriving right after a timer flush must wait out a
        // full period, not ride a near-immediate second tick.
        assert!(queue.enqueue(sample_event(3)));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(writer.batch_sizes(), vec![2]);
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(writer.batch_sizes(), vec![2, 1]);

        cancel.cancel();
        let Ok(()) = handle.await else {
            panic!("batcher task panicked");
        };
    }

    #[tokio::test]
    async fn shutdown_drains_buffered_events() {
        let writer = Arc::new(RecordingWriter::default());
        let cancel = CancellationToken::new();
        let config = BatcherConfig::default()
            .with_batch_size(100)
            .with_batch_timeout(Duration::from_secs(60));
        let (queue, handle) =
            spawn_click_batcher(16, Arc::clone(&writer), config, cancel.clone());

        for ad_id in 1..=5 {
            assert!(queue.enqueue(sample_event(ad_id)));
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        cancel.cancel();
        let Ok(()) = handle.await else {
            panic!("batcher task panicked");
        };
        assert_eq!(writer.batch_sizes(), vec![5]);
        // The consumer is gone; producers must now be rejected.
        assert!(!queue.enqueue(sample_event(6)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_batch_is_retried_then_dropped() {
        let writer = Arc::new(RecordingWriter::failing(u32::MAX));
        let cancel = CancellationToken::new();
        let config = BatcherConfig::default()
            .with_batch_size(1)
            .with_batch_timeout(Duration::from_secs(60))
            .with_max_retries(3);
        let (queue, handle) =
            spawn_click_batcher(16, Arc::clone(&writer), config, cancel.clone());

        assert!(queue.enqueue(sample_event(1)));
        // Paused virtual time fast-forwards through the 1s + 2s + 3s
        // retry backoff.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(writer.attempts(), 3);
        assert!(writer.batch_sizes().is_empty());

        cancel.cancel();
        let Ok(()) = handle.await else {
            panic!("batcher task panicked");
        };
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failure_recovers_before_retries_exhaust() {
        let writer = Arc::new(RecordingWriter::failing(2));
        let cancel = CancellationToken::new();
        let config = BatcherConfig::default()
            .with_batch_size(2)
            .with_batch_timeout(Duration::from_secs(60));
        let (queue, handle) =
            spawn_click_batcher(16, Arc::clone(&writer), config, cancel.clone());

        assert!(queue.enqueue(sample_event(1)));
        assert!(queue.enqueue(sample_event(2)));
        tokio::time::sleep(Duration::from_secs(10)).await;
        // Two injected failures, then the third attempt lands the batch.
        assert_eq!(writer.attempts(), 3);
        assert_eq!(writer.batch_sizes(), vec![2]);

        cancel.cancel();
        let Ok(()) = handle.await else {
            panic!("batcher task panicked");
        };
    }

    #[test]
    fn config_defaults_match_contract() {
        let config = BatcherConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn config_builders_clamp_to_minimums() {
        let config = BatcherConfig::default()
            .with_batch_size(0)
            .with_max_retries(0);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_retries, 1);
    }
}
