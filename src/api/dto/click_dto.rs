//! Ingestion DTOs for `POST /ads/click`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Click ingestion request body.
///
/// `ad_id` is required; a missing field is rejected at decode time.
/// `timestamp` is optional epoch seconds; values `<= 0` are ignored
/// and the server clock is used instead.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClickRequest {
    /// The ad that was clicked.
    pub ad_id: i64,
    /// Client-reported click instant in epoch seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Seconds into video playback when the click happened.
    #[serde(default)]
    pub video_playback_time: Option<i64>,
}

/// Acknowledgement returned once a click is accepted.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClickRecorded {
    /// Always `"recorded"`.
    pub status: &'static str,
}

impl ClickRecorded {
    /// The single acknowledgement value.
    #[must_use]
    pub const fn new() -> Self {
        Self { status: "recorded" }
    }
}

impl Default for ClickRecorded {
    fn default() -> Self {
        Self::new()
    }
}
