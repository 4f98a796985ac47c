//! HTTP server metrics.
//!
//! Key metrics:
//! - http.server.request.count: Counter of handled requests
//! - http.server.request.duration: Histogram of request latency in seconds
//! - http.server.response.body.size: Histogram of response body sizes
//!
//! Attributes: `http.request.method`, `http.route`, `http.response.status_code`.

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::time::Duration;

/// Instruments recorded once per request by the access-log middleware.
#[derive(Clone, Debug)]
pub struct HttpMetrics {
    /// Total number of handled requests.
    pub requests: Counter<u64>,
    /// Histogram of request latency in seconds.
    pub request_duration: Histogram<f64>,
    /// Histogram of response body sizes in bytes.
    pub response_body_size: Histogram<u64>,
}

impl HttpMetrics {
    /// Create the instruments from a meter.
    pub fn new(meter: &Meter) -> Self {
        Self {
            requests: meter
                .u64_counter("http.server.request.count")
                .with_description("Number of HTTP requests handled")
                .with_unit("1")
                .init(),
            request_duration: meter
                .f64_histogram("http.server.request.duration")
                .with_description("Duration of HTTP server requests")
                .with_unit("s")
                .init(),
            response_body_size: meter
                .u64_histogram("http.server.response.body.size")
                .with_description("Size of HTTP server response bodies")
                .with_unit("By")
                .init(),
        }
    }

    /// Record one completed request.
    pub fn record(&self, method: &str, route: &str, status: u16, bytes: u64, latency: Duration) {
        let attrs = [
            KeyValue::new("http.request.method", method.to_string()),
            KeyValue::new("http.route", route.to_string()),
            KeyValue::new("http.response.status_code", i64::from(status)),
        ];
        self.requests.add(1, &attrs);
        self.request_duration.record(latency.as_secs_f64(), &attrs);
        self.response_body_size.record(bytes, &attrs);
    }
}
