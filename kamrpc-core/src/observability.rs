//! Logging, tracing and metrics bootstrap
//!
//! Every binary in the workspace logs through `tracing`. This module wires
//! the subscriber once at startup:
//!
//! - a JSON `fmt` layer on stdout, filtered by `RUST_LOG` or the configured
//!   level
//! - optionally, an OpenTelemetry layer exporting spans over OTLP/gRPC
//! - optionally, an OTLP meter provider so instruments created through
//!   `opentelemetry::global` (the client metrics) are exported
//!
//! Export is off unless an OTLP endpoint is configured. Without one the
//! gateway still logs structured JSON locally, and metric instruments are
//! created against the no-op global provider.
//!
//! The SDK providers installed globally are also kept here, so that
//! [`shutdown_observability`] can flush queued spans and the last metric
//! interval before the process exits.
//!
//! # Usage
//!
//! ```rust,no_run
//! use kamrpc_core::ObservabilityConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ObservabilityConfig::new("kamrpc-gateway")
//!         .with_endpoint("http://localhost:4317")
//!         .with_log_level("debug");
//!
//!     kamrpc_core::init_observability(config).expect("Failed to init observability");
//!
//!     // ... serve requests ...
//!
//!     kamrpc_core::shutdown_observability();
//! }
//! ```

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type InitResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Default service name attached to every log line and span
pub const DEFAULT_SERVICE_NAME: &str = "kamrpc-gateway";

/// Providers handed to `opentelemetry::global`, held for shutdown
#[derive(Default)]
struct Providers {
    tracer: Option<SdkTracerProvider>,
    meter: Option<SdkMeterProvider>,
}

impl Providers {
    /// Shut down every held provider, flushing what is still queued
    fn shutdown(self) -> Vec<(&'static str, OTelSdkResult)> {
        let mut results = Vec::new();
        if let Some(tracer) = self.tracer {
            results.push(("traces", tracer.shutdown()));
        }
        if let Some(meter) = self.meter {
            results.push(("metrics", meter.shutdown()));
        }
        results
    }
}

static PROVIDERS: Mutex<Providers> = Mutex::new(Providers {
    tracer: None,
    meter: None,
});

fn providers() -> MutexGuard<'static, Providers> {
    PROVIDERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Observability settings
///
/// # Defaults
///
/// - service name: `kamrpc-gateway`
/// - version: the crate version
/// - OTLP endpoint: `$OTEL_EXPORTER_OTLP_ENDPOINT`, otherwise none (no export)
/// - traces and metrics enabled (only effective with an endpoint)
/// - log level: `info`
///
/// ```rust
/// use kamrpc_core::ObservabilityConfig;
///
/// let config = ObservabilityConfig::new("gateway-test")
///     .with_endpoint("http://collector:4317")
///     .with_metrics(false);
/// assert!(config.exports_traces());
/// assert!(!config.exports_metrics());
/// ```
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name for telemetry data
    pub service_name: String,

    /// Service version for telemetry data
    pub service_version: String,

    /// OTLP/gRPC collector endpoint; `None` disables export entirely
    pub otlp_endpoint: Option<String>,

    /// Export spans when an endpoint is set
    pub enable_traces: bool,

    /// Export metrics when an endpoint is set
    pub enable_metrics: bool,

    /// Fallback filter directive when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|e| !e.is_empty()),
            enable_traces: true,
            enable_metrics: true,
            log_level: "info".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Create a configuration with a custom service name
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set the OTLP collector endpoint, which turns export on
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = Some(endpoint.into());
        self
    }

    /// Clear the OTLP endpoint, keeping local logging only
    pub fn without_export(mut self) -> Self {
        self.otlp_endpoint = None;
        self
    }

    /// Set the log level filter
    ///
    /// Levels are case-insensitive (`INFO` and `info` are equivalent).
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into().to_ascii_lowercase();
        self
    }

    /// Set the service version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    /// Enable or disable span export
    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    /// Enable or disable metric export
    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// True when spans will actually be exported
    pub fn exports_traces(&self) -> bool {
        self.enable_traces && self.otlp_endpoint.is_some()
    }

    /// True when metrics will actually be exported
    pub fn exports_metrics(&self) -> bool {
        self.enable_metrics && self.otlp_endpoint.is_some()
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Initialize logging and, if configured, OTLP export
///
/// Call once at startup. A second call fails because the global subscriber
/// is already installed.
///
/// # Errors
///
/// - the log level is not a valid filter directive
/// - an OTLP exporter could not be built (bad endpoint URL)
/// - a global subscriber is already set
pub fn init_observability(config: ObservabilityConfig) -> InitResult<()> {
    let tracer = if config.exports_traces() {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.exports_metrics() {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = config.otlp_endpoint.as_deref().unwrap_or("none"),
        traces = config.exports_traces(),
        metrics = config.exports_metrics(),
        "Observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> InitResult<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let mut builder = opentelemetry_otlp::SpanExporter::builder().with_tonic();
    if let Some(endpoint) = &config.otlp_endpoint {
        builder = builder.with_endpoint(endpoint.clone());
    }
    let exporter = builder.build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    // The subscriber layer needs the tracer before the provider goes global.
    let tracer = provider.tracer(config.service_name.clone());
    providers().tracer = Some(provider.clone());
    global::set_tracer_provider(provider);

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> InitResult<()> {
    let mut builder = opentelemetry_otlp::MetricExporter::builder().with_tonic();
    if let Some(endpoint) = &config.otlp_endpoint {
        builder = builder.with_endpoint(endpoint.clone());
    }
    let exporter = builder.build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(Duration::from_secs(30))
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    providers().meter = Some(provider.clone());
    global::set_meter_provider(provider);
    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> InitResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .json();

    // `Option<Layer>` is itself a layer, so one registry covers both cases.
    let telemetry_layer = tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Flush and stop telemetry
///
/// Shuts down the tracer and meter providers installed by
/// [`init_observability`]: queued spans are exported and the periodic
/// reader runs one last collection. Call once, right before exit. Without
/// OTLP export there is nothing to stop.
pub fn shutdown_observability() {
    tracing::info!("Shutting down observability");

    let held = std::mem::take(&mut *providers());
    for (signal, result) in held.shutdown() {
        if let Err(e) = result {
            tracing::warn!(signal, error = %e, "Telemetry provider did not shut down cleanly");
        }
    }

    tracing::info!("Observability shutdown complete");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "kamrpc-gateway");
        assert_eq!(config.log_level, "info");
        assert!(config.enable_traces);
        assert!(config.enable_metrics);
    }

    #[test]
    fn test_export_requires_endpoint() {
        let config = ObservabilityConfig::new("t").without_export();
        assert!(!config.exports_traces());
        assert!(!config.exports_metrics());

        let config = config.with_endpoint("http://collector:4317");
        assert!(config.exports_traces());
        assert!(config.exports_metrics());
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_toggles_respected_with_endpoint() {
        let config = ObservabilityConfig::new("t")
            .with_endpoint("http://collector:4317")
            .with_traces(false);
        assert!(!config.exports_traces());
        assert!(config.exports_metrics());
    }

    #[test]
    fn test_log_level_normalized() {
        let config = ObservabilityConfig::new("t").with_log_level("DEBUG");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_shutdown_stops_held_providers() {
        let meter = SdkMeterProvider::builder().build();
        let held = Providers {
            tracer: None,
            meter: Some(meter.clone()),
        };

        let results = held.shutdown();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "metrics");
        assert!(results[0].1.is_ok());
        assert!(meter.shutdown().is_err());
    }

    #[test]
    fn test_nothing_held_without_export() {
        assert!(Providers::default().shutdown().is_empty());
    }

    #[test]
    fn test_local_only_init_then_second_init_fails() {
        let config = ObservabilityConfig::new("test-local").without_export();
        assert!(init_observability(config.clone()).is_ok());
        assert!(init_observability(config).is_err());
        shutdown_observability();
    }
}
