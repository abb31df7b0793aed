//! Best-effort Kafka publisher for accepted click events.
//!
//! Every accepted event is serialized to JSON and written to the
//! configured topic, keyed by the ad ID as a decimal string. Publishing
//! is fire-and-forget with a bounded deadline: failures are logged and
//! never surface to the ingestion response. The relational store, not
//! the bus, is the system of record.

use std::fmt;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};

use crate::domain::ClickEvent;

/// Hard per-message deadline for a publish.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Kafka producer handle for the click event stream.
///
/// Safe for concurrent use from many tasks. When no broker is
/// configured the publisher is disabled and `publish` is a no-op.
pub struct ClickPublisher {
    producer: Option<FutureProducer>,
    topic: String,
}

impl ClickPublisher {
    /// Creates a publisher for `topic`, or a disabled one when `broker`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`KafkaError`] if the producer cannot be constructed.
    pub fn new(broker: Option<&str>, topic: &str) -> Result<Self, KafkaError> {
        let producer = match broker {
            Some(broker) => {
                let producer: FutureProducer = ClientConfig::new()
                    .set("bootstrap.servers", broker)
                    .set("message.timeout.ms", "5000")
                    .create()?;
                tracing::info!(broker, topic, "kafka publisher ready");
                Some(producer)
            }
            None => {
                tracing::warn!("KAFKA_BROKER not set, click event publishing disabled");
                None
            }
        };
        Ok(Self {
            producer,
            topic: topic.to_string(),
        })
    }

    /// Whether a broker is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.producer.is_some()
    }

    /// Publishes one event, keyed by decimal ad ID, with a 5 s deadline.
    ///
    /// All failures are logged at error level and swallowed.
    pub async fn publish(&self, event: &ClickEvent) {
        let Some(producer) = &self.producer else {
            return;
        };

        let key = event.ad_id.to_string();
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(error = %err, ad_id = event.ad_id, "failed to serialize click event");
                return;
            }
        };

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);
        match producer.send(record, PUBLISH_TIMEOUT).await {
            Ok(_) => {
                tracing::debug!(ad_id = event.ad_id, "click event published");
            }
            Err((err, _)) => {
                tracing::error!(error = %err, ad_id = event.ad_id, "failed to publish click event");
            }
        }
    }
}

impl fmt::Debug for ClickPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickPublisher")
            .field("topic", &self.topic)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn disabled_publisher_is_a_no_op() {
        let Ok(publisher) = ClickPublisher::new(None, "ad-clicks") else {
            panic!("disabled publisher construction failed");
        };
        assert!(!publisher.is_enabled());

        let event = ClickEvent::new(1, Utc::now(), "127.0.0.1".into(), 0, "test".into());
        publisher.publish(&event).await;
    }

    #[test]
    fn message_key_is_decimal_ad_id() {
        let event = ClickEvent::new(1234, Utc::now(), "127.0.0.1".into(), 0, "test".into());
        assert_eq!(event.ad_id.to_string(), "1234");
    }

    #[test]
    fn payload_is_self_describing_json() {
        let event = ClickEvent::new(7, Utc::now(), "203.0.113.4".into(), 30, "Mozilla/5.0".into());
        let Ok(payload) = serde_json::to_vec(&event) else {
            panic!("serialization failed");
        };
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(&payload) else {
            panic!("payload is not valid JSON");
        };
        assert_eq!(value["ad_id"], 7);
        assert_eq!(value["video_playback_time"], 30);
        assert!(value["timestamp"].is_string());
    }
}
