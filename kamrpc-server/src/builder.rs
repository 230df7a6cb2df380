//! Server builder for the REST facade
//!
//! The builder provides a fluent API for configuring a `GatewayServer`. It
//! allows you to:
//! - Set the listen address
//! - Hand in the upstream client
//! - Bound request bodies
//! - Enable request metrics
//!
//! # Examples
//!
//! ```rust,no_run
//! use kamrpc_client::ClientBuilder;
//! use kamrpc_server::GatewayServer;
//!
//! # fn example() -> kamrpc_core::Result<()> {
//! let client = ClientBuilder::new("http://localhost:8081/RPC").build()?;
//! let server = GatewayServer::builder()
//!     .bind_str("127.0.0.1:8080")?
//!     .client(client)
//!     .with_metrics()
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::router::DEFAULT_BODY_LIMIT;
use crate::{GatewayServer, ServerMetrics};
use kamrpc_client::KamailioClient;
use kamrpc_core::observability::DEFAULT_SERVICE_NAME;
use kamrpc_core::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Builder for constructing a [`GatewayServer`]
pub struct ServerBuilder {
    addr: SocketAddr,
    client: Option<KamailioClient>,
    body_limit: u64,
    enable_metrics: bool,
    service_name: Option<String>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    /// Create a builder listening on `127.0.0.1:8080`
    pub fn new() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            client: None,
            body_limit: DEFAULT_BODY_LIMIT,
            enable_metrics: false,
            service_name: None,
        }
    }

    /// Set the listen address
    pub fn bind(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the listen address from a string (e.g. "127.0.0.1:8080")
    pub fn bind_str(mut self, addr: &str) -> Result<Self> {
        self.addr = addr
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("listen address {:?}: {}", addr, e)))?;
        Ok(self)
    }

    /// Set the client every route calls through
    pub fn client(mut self, client: KamailioClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Largest accepted request body in bytes
    pub fn body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    /// Record request metrics
    pub fn with_metrics(mut self) -> Self {
        self.enable_metrics = true;
        self
    }

    /// Set service name for metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the server; nothing is bound until it runs
    pub fn build(self) -> Result<GatewayServer> {
        let client = self
            .client
            .ok_or_else(|| Error::InvalidConfig("no upstream client configured".to_string()))?;

        let metrics = self.enable_metrics.then(|| {
            let name = self
                .service_name
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string());
            Arc::new(ServerMetrics::new(name))
        });

        Ok(GatewayServer {
            addr: self.addr,
            client,
            body_limit: self.body_limit,
            metrics,
        })
    }
}
