//! Error types for kamrpc
//!
//! Two error types live here:
//!
//! - **Error**: what every gateway operation returns (uses thiserror)
//! - **JsonRpcErrorData**: the `error` object exactly as the upstream sends it
//!
//! # Failure tiers
//!
//! A call to the upstream can fail in one of a few distinct ways, and callers
//! need to tell them apart (the REST facade maps them to different status
//! codes, metrics count them separately):
//!
//! - **Transport**: the HTTP exchange itself failed (`Transport`, `Timeout`)
//! - **RPC**: the upstream answered with a non-zero error code (`Rpc`),
//!   whatever the HTTP status was
//! - **Decode**: the upstream answered with something that is not the
//!   expected JSON (`Decode`)
//!
//! Nothing in this crate retries. Every error is surfaced to the caller as-is.
//!
//! # Examples
//!
//! ```rust
//! use kamrpc_core::{Error, JsonRpcErrorData};
//!
//! let err = Error::Rpc(JsonRpcErrorData::new(501, "no such table"));
//! assert_eq!(err.to_string(), "message [no such table] code [501]");
//! assert!(!err.is_transport());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for kamrpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by every kamrpc operation
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The upstream reported a non-zero error code
    ///
    /// Raised both for non-200 replies carrying an error envelope and for
    /// 200 replies with an embedded error.
    #[error("{0}")]
    Rpc(#[from] JsonRpcErrorData),

    /// Network-level failure: connection refused, reset, unreadable body
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete within the configured timeout
    #[error("request timeout")]
    Timeout,

    /// Non-200 reply whose body carries no error code
    #[error("unexpected upstream status {status}")]
    UnexpectedStatus {
        /// HTTP status returned by the upstream
        status: u16,
    },

    /// The reply body was not the JSON shape we expected
    #[error("decode error: {0}")]
    Decode(String),

    /// Request parameters could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The upstream answered HTTP 404 for a keyed lookup
    #[error("not found: {0}")]
    NotFound(String),

    /// A configuration value could not be used
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for failures of the HTTP exchange itself
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout)
    }

    /// Short label used for logs and metric attributes
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Rpc(_) => "rpc",
            Error::Transport(_) => "transport",
            Error::Timeout => "timeout",
            Error::UnexpectedStatus { .. } => "status",
            Error::Decode(_) => "decode",
            Error::Serialization(_) => "serialization",
            Error::NotFound(_) => "not_found",
            Error::InvalidConfig(_) => "config",
        }
    }
}

/// JSON-RPC 2.0 error object
///
/// Both fields default when absent, so a partial error object still parses.
/// A `code` of zero means "no error": some upstream replies carry an
/// `error` member with code 0 on success.
///
/// ```rust
/// use kamrpc_core::JsonRpcErrorData;
///
/// let err: JsonRpcErrorData = serde_json::from_str(r#"{"code":404}"#).unwrap();
/// assert!(err.is_error());
/// assert_eq!(err.message, "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Upstream error code; zero means success
    #[serde(default)]
    pub code: i64,

    /// Human-readable error message
    #[serde(default)]
    pub message: String,

    /// Optional extra information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object with code and message
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// True when the code is non-zero
    pub fn is_error(&self) -> bool {
        self.code != 0
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "message [{}] code [{}]", self.message, self.code)
    }
}

impl std::error::Error for JsonRpcErrorData {}
