//! Client builder for the upstream endpoint
//!
//! The `ClientBuilder` provides a fluent API for configuring the client
//! before use. It allows you to:
//! - Set the per-call timeout
//! - Swap the HTTP transport for another [`Transport`] (tests, proxies)
//! - Configure observability (logging, OpenTelemetry export, metrics)
//!
//! # Examples
//!
//! ```rust,no_run
//! use kamrpc_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # fn example() -> kamrpc_core::Result<()> {
//! let client = ClientBuilder::new("http://localhost:8081/RPC")
//!     .timeout(Duration::from_secs(2))
//!     .with_metrics()
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::transport::{HttpTransport, Transport, DEFAULT_TIMEOUT};
use crate::{ClientMetrics, KamailioClient};
use kamrpc_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating a [`KamailioClient`]
pub struct ClientBuilder {
    url: String,
    timeout: Duration,
    transport: Option<Arc<dyn Transport>>,
    observability_config: Option<ObservabilityConfig>,
    enable_metrics: bool,
    service_name: Option<String>,
}

impl ClientBuilder {
    /// Create a builder for the given upstream URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            observability_config: None,
            enable_metrics: false,
            service_name: None,
        }
    }

    /// Bound every upstream call by `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom transport instead of HTTP; url and timeout are ignored
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Initialize observability on build and record client metrics
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self.enable_metrics = true;
        self
    }

    /// Record client metrics on the global meter provider
    ///
    /// Use this when observability was initialized elsewhere.
    pub fn with_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Set service name for observability and metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// - `Error::InvalidConfig` for an unusable URL or a failed observability
    ///   initialization
    pub fn build(self) -> Result<KamailioClient> {
        let mut service_name = self
            .service_name
            .clone()
            .unwrap_or_else(|| kamrpc_core::observability::DEFAULT_SERVICE_NAME.to_string());

        if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }
            service_name = config.service_name.clone();

            kamrpc_core::init_observability(config).map_err(|e| {
                Error::InvalidConfig(format!("Failed to initialize observability: {}", e))
            })?;
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.url, self.timeout)?),
        };

        let mut client = KamailioClient::new(transport);
        if self.enable_metrics {
            client = client.with_metrics(Arc::new(ClientMetrics::new(service_name)));
        }

        tracing::info!(
            endpoint = client.endpoint(),
            timeout_ms = self.timeout.as_millis() as u64,
            "Upstream client ready"
        );

        Ok(client)
    }
}
