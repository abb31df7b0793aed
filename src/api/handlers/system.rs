//! System endpoints: health check and Prometheus metrics export.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::metrics::get_metrics;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    /// Current server time in epoch seconds.
    timestamp: i64,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp in epoch seconds.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().timestamp(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /metrics` — Prometheus text-format metrics export.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "System",
    summary = "Prometheus metrics",
    description = "Exports all registered metrics in Prometheus text format.",
    responses(
        (status = 200, description = "Metrics in Prometheus text format", content_type = "text/plain"),
    )
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let body = match get_metrics() {
        Some(metrics) => metrics.export().unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to encode metrics");
            String::new()
        }),
        None => String::new(),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
}
