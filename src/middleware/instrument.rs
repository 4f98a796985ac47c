//! Request instrumentation for tower-http's `TraceLayer`.
//!
//! Each request gets a server span named `METHOD /path`, parented on the
//! remote context found in the request headers. The span declares the
//! fields later middleware and handlers fill in.

use axum::http::{header, Request, Response};
use std::time::Duration;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::field::Empty;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::observability::propagation::extract_context;
use crate::observability::telemetry::SharedPropagator;

/// `MakeSpan` that builds the per-request server span.
#[derive(Clone)]
pub struct RequestSpan {
    propagator: SharedPropagator,
}

impl RequestSpan {
    pub fn new(propagator: SharedPropagator) -> Self {
        Self { propagator }
    }
}

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method().as_str();
        let path = request.uri().path();
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let span = tracing::info_span!(
            "HTTP request",
            otel.name = %format!("{method} {path}"),
            otel.kind = "server",
            otel.status_code = Empty,
            otel.status_message = Empty,
            http.request.method = method,
            url.path = path,
            user_agent.original = user_agent,
            http.response.status_code = Empty,
            trace_id = Empty,
            span_id = Empty,
        );

        span.set_parent(extract_context(self.propagator.as_ref(), request.headers()));
        span
    }
}

/// `OnResponse` that records the status code and flags 5xx as span errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordStatus;

impl<B> OnResponse<B> for RecordStatus {
    fn on_response(self, response: &Response<B>, _latency: Duration, span: &Span) {
        let status = response.status();
        span.record("http.response.status_code", status.as_u16());

        if status.is_server_error() {
            span.record("otel.status_code", "ERROR");
        }
    }
}
