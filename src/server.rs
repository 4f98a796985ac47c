//! HTTP server setup and lifecycle.
//!
//! Configures the axum router with:
//! - The root handler
//! - Instrumentation, trace-id and access-log middleware
//! - Graceful shutdown support

use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::{access_log, propagate_trace_id, LogContext, RecordStatus, RequestSpan};
use crate::observability::metrics::HttpMetrics;
use crate::observability::telemetry::{SharedPropagator, Telemetry};
use crate::service;
use crate::storage::Database;

/// Server state shared across handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub database: Option<Database>,
    pub metrics: HttpMetrics,
    pub log_context: LogContext,
    pub propagator: SharedPropagator,
}

impl AppState {
    pub fn new(config: &Config, telemetry: &Telemetry, database: Option<Database>) -> Self {
        Self {
            database,
            metrics: HttpMetrics::new(&telemetry.meter()),
            log_context: LogContext::from_config(config),
            propagator: telemetry.propagator(),
        }
    }
}

/// Create the service router.
pub fn create_router(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(RequestSpan::new(state.propagator.clone()))
                .on_response(RecordStatus),
        )
        .layer(axum::middleware::from_fn(propagate_trace_id))
        .layer(axum::middleware::from_fn_with_state(state.clone(), access_log));

    Router::new()
        .route("/", get(service::root::root))
        .layer(middleware)
        .with_state(state)
}

/// Bind the configured address and serve until shutdown.
///
/// # Arguments
///
/// * `config` - Server configuration
/// * `state` - Shared handler state
/// * `shutdown_rx` - Receiver for shutdown signal
pub async fn run_server(
    config: &Config,
    state: AppState,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(address = %config.addr, "listening and serving on {}", config.addr);

    serve(listener, state, shutdown_rx).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serve on an already-bound listener until `shutdown_rx` changes.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    let app = create_router(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
        tracing::info!("Shutdown signal received, stopping server");
    })
    .await?;

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then signal shutdown.
pub async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {
                        tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, initiating shutdown...");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler, waiting for Ctrl+C only");
                if let Err(e) = ctrl_c.await {
                    tracing::error!(error = %e, "failed to listen for Ctrl+C");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = ctrl_c.await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }

    let _ = shutdown_tx.send(true);
}
