//! Configuration parsing for the Beacon service.
//!
//! Supports:
//! - Environment variables (the primary interface)
//! - Equivalent CLI flags for local runs
//! - Defaults that match the example collector setup

use clap::Parser;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Beacon: an example HTTP service instrumented with OpenTelemetry.
#[derive(Parser, Debug, Clone)]
#[command(name = "beacon")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on (`host:port`, or `:port` for all interfaces)
    #[arg(long, env = "ADDR", default_value = ":8000", value_parser = parse_listen_addr)]
    pub addr: SocketAddr,

    /// OTLP/gRPC collector endpoint; empty disables telemetry export
    #[arg(long, env = "OTEL_ENDPOINT", default_value = "0.0.0.0:4317")]
    pub otel_endpoint: String,

    /// Service name reported in resource attributes and logs
    #[arg(long, env = "SERVICE_NAME", default_value = "ExampleService")]
    pub service_name: String,

    /// Deployment environment reported in resource attributes and logs
    #[arg(long, env = "ENVIRONMENT", default_value = "staging")]
    pub environment: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Console log format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// SQLite database path (or `:memory:`) backing the root health query
    #[arg(long, env = "DATABASE_PATH")]
    pub database_path: Option<String>,

    /// Size of the SQLite connection pool
    #[arg(long, env = "DATABASE_POOL_SIZE", default_value_t = 4)]
    pub database_pool_size: u32,

    /// Seconds to wait for the initial collector connection
    #[arg(long, env = "OTEL_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub otel_connect_timeout_secs: u64,

    /// Seconds between periodic metric exports
    #[arg(long, env = "OTEL_METRICS_INTERVAL_SECS", default_value_t = 60)]
    pub otel_metrics_interval_secs: u64,

    /// Seconds allowed for flushing telemetry on shutdown
    #[arg(long, env = "SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,
}

/// Console output format for log events.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable lines.
    Text,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Collector endpoint as a URI the gRPC transport accepts.
    ///
    /// Returns `None` when telemetry export is disabled. Endpoints without a
    /// scheme get `http://`, since the exporters use a plaintext channel.
    pub fn otel_endpoint_url(&self) -> Option<String> {
        let endpoint = self.otel_endpoint.trim();
        if endpoint.is_empty() {
            return None;
        }

        if endpoint.contains("://") {
            Some(endpoint.to_string())
        } else {
            Some(format!("http://{endpoint}"))
        }
    }

    pub fn otel_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.otel_connect_timeout_secs)
    }

    pub fn otel_metrics_interval(&self) -> Duration {
        Duration::from_secs(self.otel_metrics_interval_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            otel_endpoint: "0.0.0.0:4317".into(),
            service_name: "ExampleService".into(),
            environment: "staging".into(),
            log_level: "info".into(),
            log_format: LogFormat::Json,
            database_path: None,
            database_pool_size: 4,
            otel_connect_timeout_secs: 10,
            otel_metrics_interval_secs: 60,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Parse a listen address.
///
/// Accepts `host:port` as well as the bare `:port` form, which binds every
/// IPv4 interface.
pub fn parse_listen_addr(value: &str) -> Result<SocketAddr, String> {
    let value = value.trim();
    let candidate = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };

    candidate
        .to_socket_addrs()
        .map_err(|e| format!("invalid listen address {value:?}: {e}"))?
        .next()
        .ok_or_else(|| format!("listen address {value:?} did not resolve"))
}
