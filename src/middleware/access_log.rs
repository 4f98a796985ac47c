//! Request access log and HTTP metrics.
//!
//! Emits one structured log event per request with method, path, remote
//! address, user agent, status, byte count and duration, and stamps the
//! trace and span ids on the request span so every event logged while
//! handling the request carries them.

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::Span;

use crate::config::Config;
use crate::observability::tracing::span_ids;
use crate::server::AppState;

/// Process-wide fields attached to every access log line.
#[derive(Clone, Debug)]
pub struct LogContext {
    pub service: Arc<str>,
    pub environment: Arc<str>,
    pub hostname: Arc<str>,
}

impl LogContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            service: config.service_name.as_str().into(),
            environment: config.environment.as_str().into(),
            hostname: hostname().into(),
        }
    }
}

/// Log and measure one request.
pub async fn access_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let uri = request.uri().to_string();
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let span = Span::current();
    let (trace_id, span_id) = span_ids(&span)
        .map(|(trace_id, span_id)| (trace_id.to_string(), span_id.to_string()))
        .unwrap_or_default();
    if !trace_id.is_empty() {
        span.record("trace_id", trace_id.as_str());
        span.record("span_id", span_id.as_str());
    }

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();
    let bytes = response_size(&response);

    state
        .metrics
        .record(method.as_str(), &path, status, bytes, duration);

    tracing::info!(
        method = %method,
        url = %path,
        remote_addr = %remote_addr,
        user_agent = %user_agent,
        trace_id = %trace_id,
        span_id = %span_id,
        status_code = status,
        bytes,
        duration_ms = duration.as_secs_f64() * 1000.0,
        service = %state.log_context.service,
        environment = %state.log_context.environment,
        hostname = %state.log_context.hostname,
        "{method} {uri}"
    );

    response
}

/// Response body size, from the body's exact size hint or `Content-Length`.
fn response_size(response: &Response) -> u64 {
    if let Some(size) = response.body().size_hint().exact() {
        return size;
    }

    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Host name as reported by the operating system.
fn hostname() -> String {
    let name = gethostname::gethostname().to_string_lossy().trim().to_string();
    if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::TRACE_ID_HEADER;
    use crate::observability::telemetry::Telemetry;
    use crate::observability::testing::OtelHarness;
    use crate::server::create_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_access_log_event_fields() {
        let harness = OtelHarness::install();

        let config = Config::default();
        let app = create_router(AppState::new(&config, &Telemetry::disabled(), None));

        let mut request = Request::builder()
            .uri("/?verbose=1")
            .header(header::USER_AGENT, "beacon-test/1.0")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "10.1.2.3:4567".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let trace_id = response
            .headers()
            .get(TRACE_ID_HEADER)
            .map(|v| v.to_str().unwrap().to_string())
            .expect("trace id header");
        to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let events = harness.events();
        let line = events
            .iter()
            .find(|fields| fields.get("message").map(String::as_str) == Some("GET /?verbose=1"))
            .expect("access log event");

        let field = |name: &str| line.get(name).map(String::as_str);
        assert_eq!(field("method"), Some("GET"));
        assert_eq!(field("url"), Some("/"));
        assert_eq!(field("remote_addr"), Some("10.1.2.3:4567"));
        assert_eq!(field("user_agent"), Some("beacon-test/1.0"));
        assert_eq!(field("status_code"), Some("200"));
        assert_eq!(field("bytes"), Some("2"));
        assert_eq!(field("trace_id"), Some(trace_id.as_str()));
        assert_eq!(field("span_id").map(str::len), Some(16));
        assert_eq!(field("service"), Some("ExampleService"));
        assert_eq!(field("environment"), Some("staging"));
        assert!(field("duration_ms").is_some());
        assert!(field("hostname").is_some_and(|name| !name.is_empty()));
    }

    #[tokio::test]
    async fn test_access_log_for_unknown_route() {
        let harness = OtelHarness::install();

        let config = Config::default();
        let app = create_router(AppState::new(&config, &Telemetry::disabled(), None));
        let response = app
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let events = harness.events();
        let line = events
            .iter()
            .find(|fields| fields.get("message").map(String::as_str) == Some("GET /missing"))
            .expect("access log event");
        assert_eq!(line.get("status_code").map(String::as_str), Some("404"));
        assert_eq!(line.get("remote_addr").map(String::as_str), Some(""));
    }

    #[test]
    fn test_hostname_comes_from_system() {
        std::env::set_var("HOSTNAME", "beacon-not-the-host");
        let name = hostname();
        assert_ne!(name, "beacon-not-the-host");
        assert!(!name.is_empty());
        std::env::remove_var("HOSTNAME");
    }

    #[test]
    fn test_response_size_from_body() {
        let response = "ok".into_response();
        assert_eq!(response_size(&response), 2);

        let response = Body::empty().into_response();
        assert_eq!(response_size(&response), 0);
    }

    #[test]
    fn test_log_context_from_config() {
        let config = Config {
            service_name: "checkout".into(),
            environment: "production".into(),
            ..Config::default()
        };

        let context = LogContext::from_config(&config);
        assert_eq!(&*context.service, "checkout");
        assert_eq!(&*context.environment, "production");
        assert!(!context.hostname.is_empty());
    }
}
