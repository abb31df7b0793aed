//! ad-tracker server entry point and lifecycle controller.
//!
//! Start order: config → metrics → database pool → publisher → batcher →
//! HTTP listener. On SIGINT/SIGTERM the listener drains first, then the
//! batcher is cancelled and flushes one final time, all under a single
//! 10 s deadline; exceeding it exits non-zero.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ad_tracker::api;
use ad_tracker::app_state::AppState;
use ad_tracker::config::AppConfig;
use ad_tracker::metrics::init_metrics;
use ad_tracker::persistence::ClickStore;
use ad_tracker::service::{spawn_click_batcher, BatcherConfig, ClickPublisher};

/// Overall deadline for graceful shutdown: HTTP drain plus batcher drain.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    // Initialize tracing; RUST_LOG overrides LOG_LEVEL when set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    init_metrics()?;

    // An unreachable database is a startup failure (non-zero exit).
    let store = ClickStore::connect(&config).await?;
    tracing::info!("database connected");

    let publisher = Arc::new(ClickPublisher::new(
        config.kafka_broker.as_deref(),
        &config.kafka_topic,
    )?);

    let cancel = CancellationToken::new();
    let (queue, batcher_handle) = spawn_click_batcher(
        config.click_queue_capacity,
        Arc::new(store.clone()),
        BatcherConfig::default(),
        cancel.clone(),
    );

    let app_state = AppState {
        store,
        queue,
        publisher,
    };

    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        });
    }

    let server_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let result = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
            if let Err(err) = result {
                tracing::error!(error = %err, "http server failed");
                std::process::exit(1);
            }
        }
    });

    shutdown.cancelled().await;

    let deadline = tokio::time::Instant::now() + SHUTDOWN_DEADLINE;
    tracing::info!("draining http connections");
    if tokio::time::timeout_at(deadline, server_handle).await.is_err() {
        tracing::error!("http drain exceeded shutdown deadline");
        std::process::exit(1);
    }

    // The batcher is cancelled only after the listener has drained;
    // in-flight requests can still enqueue until then.
    cancel.cancel();
    tracing::info!("draining click batcher");
    if tokio::time::timeout_at(deadline, batcher_handle).await.is_err() {
        tracing::error!("click batcher failed to drain before shutdown deadline");
        std::process::exit(1);
    }

    tracing::info!("server exited");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
