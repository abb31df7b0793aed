//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::ClickQueue;
use crate::persistence::ClickStore;
use crate::service::ClickPublisher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Persistence gateway (owns the connection pool).
    pub store: ClickStore,
    /// Producer handle for the bounded click queue.
    pub queue: ClickQueue,
    /// Best-effort Kafka publisher.
    pub publisher: Arc<ClickPublisher>,
}
