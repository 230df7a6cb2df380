//! JSON-RPC 2.0 client for a SIP proxy's HTTP control interface
//!
//! This crate talks to the upstream's JSON-RPC endpoint and exposes one
//! typed method per upstream capability.
//!
//! # Core Features
//!
//! - **HTTP Transport**: one POST per call, no connection reuse, bounded timeout
//! - **Failure tiers**: transport, non-200 and embedded RPC errors kept apart
//! - **Dispatcher**: list, add and remove routing destinations
//! - **Htable**: dump, get, set, delete, flush, substring queries, delete-by-query
//! - **Registrations**: add and remove outbound registrations, list and filter them
//! - **Observability**: `tracing` spans per call and OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kamrpc_client::{ClientBuilder, TableQuery, UacRegistration};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> kamrpc_core::Result<()> {
//!     let client = ClientBuilder::new("http://localhost:8081/RPC")
//!         .timeout(Duration::from_secs(5))
//!         .build()?;
//!
//!     let table = client.dispatcher_list(None).await?;
//!     println!("{} dispatcher sets", table.set_count);
//!
//!     client.htable_sets("users", "user:alice", "sip:alice@10.0.0.1").await?;
//!     let hits = client.htable_query("users", &TableQuery::KeyContains("alice".into())).await?;
//!     println!("{:?}", hits);
//!
//!     let id = client.register(&UacRegistration::new("1000", "test.com")).await?;
//!     client.unregister(Some(id.as_str()), "1000", "test.com").await?;
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod dispatcher;
mod htable;
mod metrics;
mod slot;
mod transport;
mod uacreg;
mod wire;

pub use client::{KamailioClient, NotFoundPolicy};
pub use client_builder::ClientBuilder;
pub use dispatcher::{DispatcherSet, DispatcherTable, DispatcherTarget, DEFAULT_RMODE};
pub use htable::{BulkDeleteReport, HTableEntry, HTableSlot, TableQuery};
pub use metrics::ClientMetrics;
pub use slot::SlotValue;
pub use transport::{HttpTransport, Transport, TransportResponse, DEFAULT_TIMEOUT};
pub use uacreg::{Registration, RegistrationStatus, UacRegistration, DEFAULT_EXPIRES};
