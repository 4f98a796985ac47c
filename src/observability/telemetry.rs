//! OpenTelemetry provider lifecycle.
//!
//! [`Telemetry`] owns the tracer and meter providers for the life of the
//! process. It is built once before the server starts, threaded through
//! server construction, and shut down after the server stops.
//!
//! When a collector endpoint is configured:
//! - A plaintext gRPC channel is opened, blocking until it connects
//! - Spans are sampled always and exported in batches
//! - Metrics are exported on a fixed interval over the same channel
//! - Both providers and a trace-context + baggage propagator are installed
//!   as process-wide globals

use opentelemetry::global;
use opentelemetry::metrics::{Meter, MeterProvider as _, MetricsError};
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::trace::{TraceError, TracerProvider as _};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_sdk::trace::{Config as TraceConfig, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tonic::transport::{Channel, Endpoint};

use crate::config::Config;

// Semantic convention keys
const SERVICE_NAME: &str = "service.name";
const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";

/// Instrumentation scope used for the service's tracer and meter.
pub const INSTRUMENTATION_NAME: &str = "beacon";

/// Propagator shared between the router and the telemetry handle.
pub type SharedPropagator = Arc<dyn TextMapPropagator + Send + Sync>;

/// Error type for telemetry initialization.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid collector endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("failed to connect to collector at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("timed out after {timeout:?} connecting to collector at {endpoint}")]
    ConnectTimeout { endpoint: String, timeout: Duration },

    #[error("failed to initialise tracer provider: {0}")]
    Tracer(#[from] TraceError),

    #[error("failed to initialise meter provider: {0}")]
    Meter(#[from] MetricsError),
}

/// Handle over the process telemetry providers.
pub struct Telemetry {
    tracer_provider: Option<TracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    propagator: SharedPropagator,
}

impl Telemetry {
    /// Initialize telemetry from configuration.
    ///
    /// Returns a disabled handle when no collector endpoint is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the collector is unreachable or either provider
    /// cannot be built. The caller is expected to treat this as fatal.
    pub async fn init(config: &Config) -> Result<Self, TelemetryError> {
        let Some(endpoint) = config.otel_endpoint_url() else {
            return Ok(Self::disabled());
        };

        let channel = connect(&endpoint, config.otel_connect_timeout()).await?;
        let resource = build_resource(config);

        let tracer_provider = init_tracer_provider(channel.clone(), resource.clone())?;
        let meter_provider =
            init_meter_provider(channel, resource, config.otel_metrics_interval())?;

        let telemetry = Self::from_providers(Some(tracer_provider), Some(meter_provider));
        telemetry.install_globals();
        Ok(telemetry)
    }

    /// A handle with no providers. Shutdown returns immediately.
    pub fn disabled() -> Self {
        Self::from_providers(None, None)
    }

    /// Wrap already-built providers without touching the globals.
    pub fn from_providers(
        tracer_provider: Option<TracerProvider>,
        meter_provider: Option<SdkMeterProvider>,
    ) -> Self {
        Self {
            tracer_provider,
            meter_provider,
            propagator: Arc::new(composite_propagator()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tracer_provider.is_some() || self.meter_provider.is_some()
    }

    /// Tracer for the `tracing-opentelemetry` layer, if tracing is enabled.
    pub fn tracer(&self) -> Option<Tracer> {
        self.tracer_provider
            .as_ref()
            .map(|provider| provider.tracer(INSTRUMENTATION_NAME))
    }

    /// Meter for the service's instruments.
    ///
    /// Falls back to the global meter, which is a no-op unless another
    /// provider was installed.
    pub fn meter(&self) -> Meter {
        match &self.meter_provider {
            Some(provider) => provider.meter(INSTRUMENTATION_NAME),
            None => global::meter(INSTRUMENTATION_NAME),
        }
    }

    pub fn propagator(&self) -> SharedPropagator {
        Arc::clone(&self.propagator)
    }

    fn install_globals(&self) {
        if let Some(provider) = &self.tracer_provider {
            global::set_tracer_provider(provider.clone());
        }
        if let Some(provider) = &self.meter_provider {
            global::set_meter_provider(provider.clone());
        }
        global::set_text_map_propagator(composite_propagator());
    }

    /// Flush and close both providers.
    ///
    /// Runs on a dedicated thread bounded by `timeout`. The thread is
    /// detached, so a collector that never answers cannot hold up process
    /// exit past the deadline. Each failure is logged and does not stop the
    /// other provider from shutting down. Calling this more than once is a
    /// no-op after the first call.
    pub async fn shutdown(&mut self, timeout: Duration) {
        let tracer_provider = self.tracer_provider.take();
        let meter_provider = self.meter_provider.take();

        if tracer_provider.is_none() && meter_provider.is_none() {
            return;
        }

        let (done_tx, done_rx) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name("telemetry-shutdown".into())
            .spawn(move || {
                if let Some(provider) = tracer_provider {
                    if let Err(e) = provider.shutdown() {
                        tracing::error!(error = %e, "shutting down tracer provider");
                    }
                }

                if let Some(provider) = meter_provider {
                    if let Err(e) = provider.shutdown() {
                        tracing::error!(error = %e, "shutting down meter provider");
                    }
                }

                let _ = done_tx.send(());
            });

        if let Err(e) = spawned {
            tracing::error!(error = %e, "failed to spawn telemetry shutdown thread");
            return;
        }

        match tokio::time::timeout(timeout, done_rx).await {
            Ok(Ok(())) => tracing::info!("Telemetry shut down"),
            Ok(Err(_)) => tracing::error!("Telemetry shutdown thread exited early"),
            Err(_) => tracing::warn!(?timeout, "Telemetry shutdown timed out"),
        }
    }
}

/// W3C trace context plus baggage.
pub fn composite_propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

/// Resource attributes attached to every span and metric.
pub fn build_resource(config: &Config) -> Resource {
    Resource::new([
        KeyValue::new(SERVICE_NAME, config.service_name.clone()),
        KeyValue::new(DEPLOYMENT_ENVIRONMENT, config.environment.clone()),
    ])
}

async fn connect(endpoint: &str, timeout: Duration) -> Result<Channel, TelemetryError> {
    let target = Endpoint::from_shared(endpoint.to_string())
        .map_err(|source| TelemetryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })?
        .connect_timeout(timeout);

    match tokio::time::timeout(timeout, target.connect()).await {
        Ok(Ok(channel)) => Ok(channel),
        Ok(Err(source)) => Err(TelemetryError::Connect {
            endpoint: endpoint.to_string(),
            source,
        }),
        Err(_) => Err(TelemetryError::ConnectTimeout {
            endpoint: endpoint.to_string(),
            timeout,
        }),
    }
}

fn init_tracer_provider(channel: Channel, resource: Resource) -> Result<TracerProvider, TraceError> {
    // Every trace is sampled; this is a demonstration service.
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_channel(channel))
        .with_trace_config(
            TraceConfig::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(resource),
        )
        .install_batch(runtime::Tokio)
}

fn init_meter_provider(
    channel: Channel,
    resource: Resource,
    interval: Duration,
) -> Result<SdkMeterProvider, MetricsError> {
    opentelemetry_otlp::new_pipeline()
        .metrics(runtime::Tokio)
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_channel(channel))
        .with_resource(resource)
        .with_period(interval)
        .build()
}
