//! Core types for kamrpc, a REST gateway in front of a SIP proxy's
//! JSON-RPC control interface
//!
//! This crate holds everything that does not touch the network:
//!
//! - **Types**: JSON-RPC 2.0 request and response envelopes
//! - **Codec**: envelope encoding and RPC-error detection
//! - **Error handling**: the error taxonomy shared by client and server
//! - **Ident**: deterministic registration identifiers
//! - **Observability**: `tracing` subscriber and OpenTelemetry export setup
//!
//! The `kamrpc-client` crate sends these envelopes over HTTP and decodes the
//! method-specific results; `kamrpc-server` exposes them as REST routes.
//!
//! # Example
//!
//! ```rust
//! use kamrpc_core::{codec, ident, Id, JsonRpcRequest};
//! use serde_json::json;
//!
//! let id = ident::derive_id("1000@test.com");
//! let request = JsonRpcRequest::new("uac.reg_remove", Some(json!({"l_uuid": id})), Id::random());
//!
//! let bytes = codec::encode_request(&request).unwrap();
//! assert!(String::from_utf8(bytes).unwrap().contains("1648c7d7-278b-174e-9983-62b9463fef1c"));
//! ```

pub mod codec;
pub mod error;
pub mod ident;
pub mod observability;
pub mod types;

pub use error::{Error, JsonRpcErrorData, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
