//! In-memory OpenTelemetry pipeline for unit tests.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::{InMemorySpanExporter, InMemorySpanExporterBuilder};
use opentelemetry_sdk::trace::TracerProvider;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Fields of one captured log event, rendered as strings.
pub type EventFields = HashMap<&'static str, String>;

/// Thread-local subscriber that bridges spans into an in-memory exporter.
///
/// Spans are exported synchronously when they close, so assertions can run
/// as soon as the last handle to a span is dropped. Log events are captured
/// alongside.
pub struct OtelHarness {
    exporter: InMemorySpanExporter,
    events: EventCapture,
    _provider: TracerProvider,
    _guard: DefaultGuard,
}

impl OtelHarness {
    pub fn install() -> Self {
        let exporter = InMemorySpanExporterBuilder::new().build();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let events = EventCapture::default();

        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("beacon-test")))
            .with(events.clone());
        let guard = tracing::subscriber::set_default(subscriber);

        Self {
            exporter,
            events,
            _provider: provider,
            _guard: guard,
        }
    }

    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.exporter.get_finished_spans().unwrap_or_default()
    }

    pub fn events(&self) -> Vec<EventFields> {
        self.events.0.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[derive(Clone, Default)]
struct EventCapture(Arc<Mutex<Vec<EventFields>>>);

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        if let Ok(mut events) = self.0.lock() {
            events.push(visitor.0);
        }
    }
}

#[derive(Default)]
struct FieldVisitor(EventFields);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name(), format!("{value:?}"));
    }
}
