//! Ad listing handler: `GET /ads`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, TrackerError};

/// `GET /ads` — List all active ads.
///
/// # Errors
///
/// Returns a 500 with a client-safe message when the store is unavailable.
#[utoipa::path(
    get,
    path = "/api/v1/ads",
    tag = "Ads",
    summary = "List active ads",
    description = "Returns every ad currently flagged active.",
    responses(
        (status = 200, description = "Active ads", body = serde_json::Value),
        (status = 500, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn list_ads(State(state): State<AppState>) -> Result<impl IntoResponse, TrackerError> {
    let ads = state.store.list_active_ads().await.map_err(|err| {
        tracing::error!(error = %err, "failed to fetch ads");
        TrackerError::Internal("Failed to fetch ads".to_string())
    })?;

    Ok(Json(json!({ "ads": ads })))
}
