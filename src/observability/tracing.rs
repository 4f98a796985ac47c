//! Structured logging and span helpers.
//!
//! Configures the `tracing` subscriber with:
//! - Environment-based filter (via RUST_LOG)
//! - JSON or text console output
//! - OpenTelemetry span export when a tracer is available

use opentelemetry::trace::{SpanId, TraceContextExt, TraceId};
use opentelemetry_sdk::trace::Tracer;
use tracing::{Span, Subscriber};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::{Config, LogFormat};

/// Status message set on a span when the handler reports a failure.
pub const ERROR_STATUS_MESSAGE: &str = "root failed";

/// Initialize the global tracing subscriber.
///
/// This sets up:
/// - Console logging in the configured format
/// - Environment-based filter (`--log-level` / RUST_LOG)
/// - The OpenTelemetry layer, when `tracer` is provided
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &Config, tracer: Option<Tracer>) -> Result<(), TryInitError> {
    build_subscriber(config, tracer).try_init()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "Tracing initialized"
    );
    Ok(())
}

/// Build the subscriber installed by [`init_tracing`].
///
/// The log level only filters console output. Spans reach the OpenTelemetry
/// layer down to `INFO` whatever the log level, so request spans are
/// exported even when the console is set to `warn`.
pub fn build_subscriber(
    config: &Config,
    tracer: Option<Tracer>,
) -> impl Subscriber + Send + Sync + 'static {
    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info,beacon=debug"));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
    };

    let otel_layer = tracer.map(|tracer| {
        tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(LevelFilter::INFO)
    });

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .with(otel_layer)
}

/// Trace and span id of `span`, if it is bridged to an OpenTelemetry span.
pub fn span_ids(span: &Span) -> Option<(TraceId, SpanId)> {
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.trace_id() == TraceId::INVALID {
        return None;
    }
    Some((span_context.trace_id(), span_context.span_id()))
}

/// Trace id of the current span, if any.
pub fn current_trace_id() -> Option<TraceId> {
    span_ids(&Span::current()).map(|(trace_id, _)| trace_id)
}

/// Mark `span` as failed and record an `exception` event carrying `message`.
///
/// The span must declare the `otel.status_code` and `otel.status_message`
/// fields; the request spans built by the instrumentation middleware do.
pub fn record_error(span: &Span, message: &str) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", ERROR_STATUS_MESSAGE);
    span.in_scope(|| {
        tracing::error!(exception.message = %message, "exception");
    });
}
