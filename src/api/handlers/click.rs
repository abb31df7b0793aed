//! Click ingestion handler: `POST /ads/click`.
//!
//! The acknowledgement path is bounded by the ad lookup plus a
//! non-blocking enqueue (or, on queue overflow, one synchronous insert).
//! Batch persistence and bus publication happen asynchronously and are
//! never awaited here.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};

use crate::api::dto::{ClickRecorded, ClickRequest};
use crate::app_state::AppState;
use crate::domain::ClickEvent;
use crate::error::{ErrorResponse, TrackerError};
use crate::metrics::get_metrics;

/// `POST /ads/click` — Record a click on an ad.
///
/// # Errors
///
/// Returns [`TrackerError::BadRequest`] on a malformed body,
/// [`TrackerError::AdNotFound`] for an unknown ad, and a 500-class error
/// when the store is unavailable.
#[utoipa::path(
    post,
    path = "/api/v1/ads/click",
    tag = "Ads",
    summary = "Record an ad click",
    description = "Validates the ad, captures connection-level fields, and acknowledges as soon as the event is queued for batched persistence. On queue overflow the event is persisted synchronously before the acknowledgement.",
    request_body = ClickRequest,
    responses(
        (status = 200, description = "Click recorded", body = ClickRecorded),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 404, description = "Ad not found", body = ErrorResponse),
        (status = 500, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn record_click(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ClickRequest>, JsonRejection>,
) -> Result<impl IntoResponse, TrackerError> {
    let Json(req) = payload.map_err(|rejection| TrackerError::BadRequest(rejection.body_text()))?;

    state.store.lookup_ad(req.ad_id).await?;

    let event = ClickEvent::new(
        req.ad_id,
        resolve_timestamp(req.timestamp, Utc::now()),
        client_ip(&headers, peer),
        req.video_playback_time.unwrap_or(0),
        user_agent(&headers),
    );

    if !state.queue.enqueue(event.clone()) {
        // Overflow fallback: one synchronous insert, no retry.
        state.store.insert_click(&event).await.map_err(|err| {
            tracing::error!(error = %err, ad_id = event.ad_id, "failed to save click event");
            TrackerError::Internal("Failed to record click".to_string())
        })?;
    }

    if let Some(metrics) = get_metrics() {
        metrics
            .clicks_received
            .with_label_values(&[&req.ad_id.to_string()])
            .inc();
        metrics.queue_size.set(state.queue.len() as f64);
    }

    let publisher = Arc::clone(&state.publisher);
    tokio::spawn(async move {
        publisher.publish(&event).await;
    });

    Ok(Json(ClickRecorded::new()))
}

/// Resolves the event timestamp: the client-supplied instant when present
/// and positive, the server clock otherwise. A zero timestamp means "not
/// provided", never the epoch.
fn resolve_timestamp(client_secs: Option<i64>, now: DateTime<Utc>) -> DateTime<Utc> {
    match client_secs {
        Some(secs) if secs > 0 => DateTime::from_timestamp(secs, 0).unwrap_or(now),
        _ => now,
    }
}

/// Client IP: first entry of `X-Forwarded-For` when present, else the
/// socket peer address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}

/// User agent header, empty when absent or non-UTF-8.
fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> SocketAddr {
        "192.0.2.10:4242".parse().ok().unwrap_or_else(|| {
            panic!("invalid peer address");
        })
    }

    #[test]
    fn client_timestamp_is_honored() {
        let now = Utc::now();
        let resolved = resolve_timestamp(Some(1_000_000_000), now);
        assert_eq!(resolved.timestamp(), 1_000_000_000);
    }

    #[test]
    fn zero_timestamp_uses_server_clock() {
        let now = Utc::now();
        assert_eq!(resolve_timestamp(Some(0), now), now);
    }

    #[test]
    fn negative_timestamp_uses_server_clock() {
        let now = Utc::now();
        assert_eq!(resolve_timestamp(Some(-5), now), now);
    }

    #[test]
    fn missing_timestamp_uses_server_clock() {
        let now = Utc::now();
        assert_eq!(resolve_timestamp(None, now), now);
    }

    #[test]
    fn client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn client_ip_falls_back_to_peer() {
        let headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer()), "192.0.2.10");
    }

    #[test]
    fn user_agent_defaults_to_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_agent(&headers), "");
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        assert_eq!(user_agent(&headers), "Mozilla/5.0");
    }
}
