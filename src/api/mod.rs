//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Ad endpoints are mounted under `/api/v1`; health and metrics live at
//! the root.

pub mod dto;
pub mod handlers;
pub mod middleware;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI documentation for the ad-tracker REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ad-tracker",
        version = "1.0.0",
        description = "High-throughput ad click ingestion, batched persistence, and analytics service.",
        license(name = "MIT"),
    ),
    tags(
        (name = "System", description = "Health check and metrics export"),
        (name = "Ads", description = "Ad listing, click ingestion, and analytics"),
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::metrics_handler,
        handlers::ads::list_ads,
        handlers::click::record_click,
        handlers::analytics::get_analytics,
    ),
    components(schemas(
        crate::domain::Ad,
        crate::error::ErrorResponse,
        dto::ClickRequest,
        dto::ClickRecorded,
        dto::AdAnalytics,
    ))
)]
#[derive(Debug)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints and the
/// request timing middleware.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .layer(axum::middleware::from_fn(middleware::track_metrics))
}
