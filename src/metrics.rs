//! Process-global Prometheus metrics registry.
//!
//! Defines the four telemetry signals of the ingestion pipeline plus the
//! dropped-batch counter, registered against a private [`Registry`] and
//! exported in Prometheus text format by the `/metrics` endpoint.

use std::sync::OnceLock;

use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

/// Global metrics instance (initialized explicitly via `init_metrics()`).
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize the global metrics registry.
///
/// Returns `Ok(())` if metrics were successfully created and registered,
/// or if they were already initialized.
///
/// # Errors
///
/// Returns a [`prometheus::Error`] if metric creation or registration fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }
    let metrics = Metrics::try_new()?;
    // Another thread may have initialized between the check and here.
    let _ = METRICS.set(metrics);
    Ok(())
}

/// Get a reference to the global metrics, if initialized.
pub fn get_metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Application metrics container.
pub struct Metrics {
    /// Internal Prometheus registry.
    registry: Registry,

    /// Click events accepted by the ingestion endpoint, by ad.
    pub clicks_received: CounterVec,
    /// Click events durably persisted by the batcher.
    pub clicks_processed: Counter,
    /// Batches discarded after exhausting all insert retries.
    pub batches_dropped: Counter,
    /// HTTP request latency by method, endpoint, and status code.
    pub response_time: HistogramVec,
    /// Current occupancy of the click queue.
    pub queue_size: Gauge,
}

impl Metrics {
    fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let clicks_received = CounterVec::new(
            Opts::new(
                "ad_clicks_received_total",
                "Total number of click events received",
            ),
            &["ad_id"],
        )?;

        let clicks_processed = Counter::new(
            "ad_clicks_processed_total",
            "Total number of click events processed",
        )?;

        let batches_dropped = Counter::new(
            "ad_click_batches_dropped_total",
            "Total number of click batches dropped after all insert retries failed",
        )?;

        let response_time = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let queue_size = Gauge::new(
            "click_queue_size",
            "Current size of the click processing queue",
        )?;

        registry.register(Box::new(clicks_received.clone()))?;
        registry.register(Box::new(clicks_processed.clone()))?;
        registry.register(Box::new(batches_dropped.clone()))?;
        registry.register(Box::new(response_time.clone()))?;
        registry.register(Box::new(queue_size.clone()))?;

        Ok(Self {
            registry,
            clicks_received,
            clicks_processed,
            batches_dropped,
            response_time,
            queue_size,
        })
    }

    /// Export all registered metrics in Prometheus text format.
    ///
    /// # Errors
    ///
    /// Returns a [`prometheus::Error`] if encoding fails.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
