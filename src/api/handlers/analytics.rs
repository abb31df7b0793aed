//! Analytics handler: `GET /ads/analytics`.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::api::dto::{AdAnalytics, AnalyticsParams, Timeframe};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, TrackerError};
use crate::persistence::ClickStore;

/// `GET /ads/analytics` — Aggregate click counts.
///
/// With `ad_id` the response carries a single object under `analytics`;
/// without it, an array covering every ad that saw a click inside the
/// window. `last_hour` and `last_day` are fixed rolling windows
/// regardless of the requested timeframe.
///
/// # Errors
///
/// Returns [`TrackerError::BadRequest`] for an unparseable `ad_id` and a
/// 500-class error when the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/ads/analytics",
    tag = "Ads",
    summary = "Aggregate click analytics",
    description = "Counts clicks per ad within the requested timeframe (1h, 24h, 7d, all; unknown values behave as 24h), plus fixed last-hour and last-day windows.",
    params(AnalyticsParams),
    responses(
        (status = 200, description = "Aggregated analytics", body = serde_json::Value),
        (status = 400, description = "Invalid ad_id", body = ErrorResponse),
        (status = 500, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<impl IntoResponse, TrackerError> {
    let timeframe = Timeframe::parse(params.timeframe.as_deref().unwrap_or("24h"));
    // One instant per request; every window is computed against it.
    let now = Utc::now();
    let since = now - timeframe.duration();

    let ad_id = params.ad_id.as_deref().filter(|raw| !raw.is_empty());
    match ad_id {
        Some(raw) => {
            let ad_id: i64 = raw
                .parse()
                .map_err(|_| TrackerError::BadRequest("Invalid ad_id".to_string()))?;
            let analytics = ad_analytics(&state.store, ad_id, since, now).await?;
            Ok(Json(json!({ "analytics": analytics })))
        }
        None => {
            let ad_ids = state.store.distinct_ad_ids_since(since).await?;
            let mut analytics = Vec::with_capacity(ad_ids.len());
            for ad_id in ad_ids {
                analytics.push(ad_analytics(&state.store, ad_id, since, now).await?);
            }
            Ok(Json(json!({ "analytics": analytics })))
        }
    }
}

/// Computes the aggregate triple for one ad against a shared `now`.
async fn ad_analytics(
    store: &ClickStore,
    ad_id: i64,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<AdAnalytics, TrackerError> {
    let click_count = store.count_clicks(Some(ad_id), since).await?;
    let last_hour = store
        .count_clicks(Some(ad_id), now - Duration::hours(1))
        .await?;
    let last_day = store
        .count_clicks(Some(ad_id), now - Duration::hours(24))
        .await?;

    Ok(AdAnalytics {
        ad_id,
        click_count,
        last_hour,
        last_day,
    })
}
