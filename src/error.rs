//! Crate-level error type.
//!
//! Component errors live next to their components; this enum collects the
//! ones that can abort startup or the server loop.

use thiserror::Error;

use crate::observability::telemetry::TelemetryError;
use crate::storage::StorageError;

/// Errors surfaced by the startup sequence and the server.
#[derive(Debug, Error)]
pub enum Error {
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to install tracing subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
