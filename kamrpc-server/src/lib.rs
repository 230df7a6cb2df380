//! REST facade over the kamrpc client
//!
//! This crate exposes the upstream's dispatcher, htable and registration
//! capabilities as plain HTTP routes under `/v1`. Each route validates its
//! input, makes exactly one adapter call through a shared
//! [`KamailioClient`] and maps the outcome to a status code.
//!
//! # Core Features
//!
//! - **Routes**: `warp` filters for every adapter, see [`router`]
//! - **Errors**: JSON string bodies with 400, 404, 405 or 500
//! - **Configuration**: environment-driven [`GatewayConfig`]
//! - **Observability**: one `tracing` line per request, optional metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kamrpc_client::ClientBuilder;
//! use kamrpc_server::{GatewayConfig, GatewayServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig::from_env()?;
//!     let client = ClientBuilder::new(&config.upstream_url)
//!         .timeout(config.rpc_timeout)
//!         .build()?;
//!
//!     let server = GatewayServer::builder()
//!         .bind(config.listen_addr)
//!         .client(client)
//!         .build()?;
//!
//!     server.run(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! `warp` serves every request on its own task. Handlers share nothing but
//! the cloned client, so concurrent requests never wait on each other inside
//! the gateway.

mod builder;
mod config;
mod error;
mod handler;
mod metrics;
pub mod router;

pub use builder::ServerBuilder;
pub use config::GatewayConfig;
pub use error::{handle_rejection, ApiError};
pub use metrics::ServerMetrics;

use kamrpc_client::KamailioClient;
use kamrpc_core::{Error, Result};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

/// REST gateway in front of the upstream control interface
///
/// # Lifecycle
///
/// 1. **Build**: create the server with `GatewayServer::builder()`
/// 2. **Run**: `server.run(shutdown).await` binds and serves
/// 3. **Shutdown**: resolve the `shutdown` future; in-flight requests finish
pub struct GatewayServer {
    addr: SocketAddr,
    client: KamailioClient,
    body_limit: u64,
    metrics: Option<Arc<ServerMetrics>>,
}

impl GatewayServer {
    /// Create a new server builder
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Configured listen address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Client the routes call through
    pub fn client(&self) -> &KamailioClient {
        &self.client
    }

    /// The complete route tree, for serving or for `warp::test`
    pub fn filter(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = Infallible> + Clone + Send + Sync + 'static
    {
        router::routes(self.client.clone(), self.body_limit, self.metrics.clone())
    }

    /// Bind the listen address and return the bound address with the serving future
    ///
    /// The future completes once `shutdown` resolves and in-flight requests
    /// have been answered.
    pub fn bind(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(SocketAddr, impl Future<Output = ()> + 'static)> {
        warp::serve(self.filter())
            .try_bind_with_graceful_shutdown(self.addr, shutdown)
            .map_err(|e| Error::InvalidConfig(format!("cannot listen on {}: {}", self.addr, e)))
    }

    /// Serve until `shutdown` resolves
    #[tracing::instrument(skip(self, shutdown), name = "server.run")]
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let (addr, server) = self.bind(shutdown)?;
        tracing::info!(addr = %addr, upstream = self.client.endpoint(), "Gateway listening");

        server.await;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}
