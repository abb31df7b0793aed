//! Ad and click event records.
//!
//! [`Ad`] rows are provisioned out-of-band and only read by this service.
//! [`ClickEvent`] values are constructed at the ingestion edge, capturing
//! the connection-level fields at the moment of acceptance, and persisted
//! by the batcher (or the synchronous overflow fallback).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An ad creative with its destination URL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Ad {
    /// Database-assigned identity.
    pub id: i64,
    /// URL of the creative image.
    pub image_url: String,
    /// URL the ad links to.
    pub target_url: String,
    /// Human-readable title.
    pub title: String,
    /// Whether the ad is currently being served.
    pub active: bool,
    /// Row creation instant.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

/// A single recorded click on an ad.
///
/// `id` is zero until the row is persisted; the database assigns the
/// identity on insert. `processed` is reserved for a downstream consumer
/// and never set by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClickEvent {
    pub id: i64,
    pub ad_id: i64,
    /// Click instant, UTC. Either client-supplied or captured at acceptance.
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    /// Seconds into video playback when the click happened.
    pub video_playback_time: i64,
    pub user_agent: String,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

impl ClickEvent {
    /// Builds a new unpersisted click event captured at `created_at`.
    #[must_use]
    pub fn new(
        ad_id: i64,
        timestamp: DateTime<Utc>,
        ip_address: String,
        video_playback_time: i64,
        user_agent: String,
    ) -> Self {
        Self {
            id: 0,
            ad_id,
            timestamp,
            ip_address,
            video_playback_time,
            user_agent,
            processed: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_event_is_unpersisted_and_unprocessed() {
        let now = Utc::now();
        let event = ClickEvent::new(3, now, "10.0.0.1".into(), 15, "curl/8.5".into());
        assert_eq!(event.id, 0);
        assert_eq!(event.ad_id, 3);
        assert_eq!(event.timestamp, now);
        assert!(!event.processed);
        assert!(event.created_at >= now);
    }

    #[test]
    fn event_serializes_public_fields() {
        let now = Utc::now();
        let event = ClickEvent::new(42, now, "192.168.1.9".into(), 0, "Mozilla/5.0".into());
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(value["ad_id"], 42);
        assert_eq!(value["ip_address"], "192.168.1.9");
        assert_eq!(value["video_playback_time"], 0);
        assert_eq!(value["user_agent"], "Mozilla/5.0");
        assert_eq!(value["processed"], false);
    }
}
