//! Beacon: an example HTTP service instrumented with OpenTelemetry.
//!
//! # Usage
//!
//! ```bash
//! ADDR=:8000 OTEL_ENDPOINT=localhost:4317 beacon
//! ```
//!
//! Environment variables:
//! - `ADDR`: Listen address (default `:8000`)
//! - `OTEL_ENDPOINT`: OTLP/gRPC collector, empty to disable export
//! - `SERVICE_NAME`, `ENVIRONMENT`: Resource attributes
//! - `DATABASE_PATH`: Serve `SELECT 1` from this SQLite database
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anyhow::Context;
use beacon::config::Config;
use beacon::observability::telemetry::Telemetry;
use beacon::observability::tracing::init_tracing;
use beacon::server::{run_server, shutdown_signal, AppState};
use beacon::storage::Database;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config, telemetry: &Telemetry) {
    let version = env!("CARGO_PKG_VERSION");
    let collector = if telemetry.is_enabled() {
        config.otel_endpoint.as_str()
    } else {
        "disabled"
    };
    eprintln!(
        r#"
  Beacon v{}

  Configuration:
    Address:      {}
    Service:      {} ({})
    Collector:    {}
    Database:     {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.addr,
        config.service_name,
        config.environment,
        collector,
        config.database_path.as_deref().unwrap_or("none"),
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Connect the exporters before logging so spans flow from the first event
    let mut telemetry = Telemetry::init(&config)
        .await
        .context("failed to initialize telemetry")?;

    init_tracing(&config, telemetry.tracer()).context("failed to initialize logging")?;

    let database = config
        .database_path
        .as_deref()
        .map(|path| Database::open(path, config.database_pool_size))
        .transpose()
        .context("failed to open database")?;

    print_banner(&config, &telemetry);

    // Create shutdown signal channel and spawn the signal handler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(shutdown_signal(shutdown_tx));

    let state = AppState::new(&config, &telemetry, database);
    let result = run_server(&config, state, shutdown_rx).await;

    // Flush telemetry even when the server failed
    telemetry.shutdown(config.shutdown_timeout()).await;

    result.context("server error")?;
    tracing::info!("Beacon shutdown complete");
    Ok(())
}
