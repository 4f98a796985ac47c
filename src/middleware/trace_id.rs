//! Trace id response header.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::observability::tracing::current_trace_id;

/// Response header carrying the active trace id.
pub const TRACE_ID_HEADER: HeaderName = HeaderName::from_static("x-trace-id");

/// Copy the active trace id into the `X-Trace-ID` response header.
///
/// The header is only set when the request span is bridged to a valid
/// OpenTelemetry trace.
pub async fn propagate_trace_id(request: Request, next: Next) -> Response {
    let trace_id = current_trace_id();

    let mut response = next.run(request).await;

    if let Some(trace_id) = trace_id {
        if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
            response.headers_mut().insert(TRACE_ID_HEADER, value);
        }
    }

    response
}
