//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - Tracer and meter provider lifecycle
//! - Structured logging with OpenTelemetry span export
//! - HTTP server metrics
//! - Trace context extraction from request headers

pub mod metrics;
pub mod propagation;
pub mod telemetry;
pub mod tracing;

#[cfg(test)]
pub(crate) mod testing;
