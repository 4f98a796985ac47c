//! Beacon: an example HTTP service instrumented with OpenTelemetry.
//!
//! Beacon answers `GET /` and exports a server span, request metrics and
//! a structured access log line for every request.
//!
//! # Architecture
//!
//! - **HTTP**: axum router with tower-http request spans
//! - **Tracing**: `tracing` spans bridged to OTLP/gRPC via tracing-opentelemetry
//! - **Metrics**: OpenTelemetry instruments exported periodically over OTLP
//! - **Storage**: optional SQLite pool answering `SELECT 1`
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`middleware`]: Request spans, trace id header, access log
//! - [`observability`]: Telemetry providers, subscriber and metrics setup
//! - [`server`]: HTTP server setup and lifecycle
//! - [`service`]: Request handlers
//! - [`storage`]: SQLite connection pool

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::StorageError is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::struct_excessive_bools      // Config structs may have flags
)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod service;
pub mod storage;

pub use error::{Error, Result};
