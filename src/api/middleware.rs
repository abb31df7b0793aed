//! Request timing middleware feeding the latency histogram.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::metrics::get_metrics;

/// Observes every request's duration into
/// `http_request_duration_seconds{method, endpoint, status_code}`.
///
/// The endpoint label uses the matched route template (e.g.
/// `/api/v1/ads/click`), falling back to the raw path for requests
/// that matched no route.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;

    if let Some(metrics) = get_metrics() {
        metrics
            .response_time
            .with_label_values(&[method.as_str(), &endpoint, response.status().as_str()])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}
