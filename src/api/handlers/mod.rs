//! REST endpoint handlers organized by resource.

pub mod ads;
pub mod analytics;
pub mod click;
pub mod system;

use axum::routing::{get, post};
use axum::Router;

use crate::app_state::AppState;

/// Composes all ad routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ads", get(ads::list_ads))
        .route("/ads/click", post(click::record_click))
        .route("/ads/analytics", get(analytics::get_analytics))
}
