//! kamrpc-gateway: serve the REST facade in front of the upstream JSON-RPC endpoint
//!
//! Configuration comes from the environment, see `kamrpc_server::GatewayConfig`.
//! The process stops gracefully on Ctrl-C.

use kamrpc_client::ClientBuilder;
use kamrpc_server::{GatewayConfig, GatewayServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    let client = ClientBuilder::new(&config.upstream_url)
        .timeout(config.rpc_timeout)
        .with_observability(config.observability())
        .build()?;

    tracing::info!(
        listen = %config.listen_addr,
        upstream = %config.upstream_url,
        timeout_ms = config.rpc_timeout.as_millis() as u64,
        otlp = config.otlp_endpoint.is_some(),
        "Starting gateway"
    );

    let server = GatewayServer::builder()
        .bind(config.listen_addr)
        .client(client)
        .with_metrics()
        .build()?;

    let result = server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
        })
        .await;

    kamrpc_core::shutdown_observability();
    result.map_err(Into::into)
}
