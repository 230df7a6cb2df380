//! kamrpc - REST gateway for a SIP proxy's JSON-RPC control interface
//!
//! This is the main convenience crate that re-exports all kamrpc sub-crates.
//!
//! # Architecture
//!
//! kamrpc is organized into modular crates:
//!
//! - **kamrpc-core**: envelope types, codec, error taxonomy, identifier derivation, observability
//! - **kamrpc-client**: HTTP transport and typed adapters for every upstream method
//! - **kamrpc-server**: REST facade, configuration and server lifecycle
//!
//! The `kamrpc-gateway` binary wires the three together from environment
//! configuration.
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use kamrpc::KamailioClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KamailioClient::builder("http://localhost:8081/RPC").build()?;
//!
//!     for entry in client.htable_dump("users").await? {
//!         for slot in entry.slots {
//!             println!("{} = {}", slot.name, slot.value);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use kamrpc::{GatewayServer, KamailioClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KamailioClient::builder("http://localhost:8081/RPC").build()?;
//!     let server = GatewayServer::builder()
//!         .bind_str("127.0.0.1:8080")?
//!         .client(client)
//!         .build()?;
//!
//!     server.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//!     Ok(())
//! }
//! ```

pub use kamrpc_client as client;
pub use kamrpc_core as core;
pub use kamrpc_server as server;

pub use kamrpc_client::KamailioClient;
pub use kamrpc_server::{GatewayConfig, GatewayServer};
