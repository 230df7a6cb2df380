//! JSON-RPC 2.0 envelopes as spoken by the upstream control interface
//!
//! The upstream is a strict request/response peer: every call is a single
//! HTTP POST carrying one request envelope, answered by one response
//! envelope. There are no notifications, no batches and no server pushes,
//! so only the two envelope shapes below are modelled.
//!
//! # Typed params and results
//!
//! Both envelopes are generic over their payload. Each method adapter
//! declares one named params type and one named result type, so the wire
//! contract of every upstream method is spelled out in a struct instead of
//! being assembled from loose `serde_json::Value`s.
//!
//! # Tolerant decoding
//!
//! The upstream does not always fill every envelope field (error replies
//! sometimes omit `id`, some methods omit `result`). Every response field is
//! therefore optional or defaulted; the codec decides what is an error.

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version carried by every outgoing envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request ID
///
/// Outgoing requests always use [`Id::String`] holding a fresh UUID. The
/// other variants exist because the upstream echoes whatever it parsed,
/// and a reply to a malformed request comes back with a null id.
///
/// ```rust
/// use kamrpc_core::Id;
///
/// let id: Id = "req-123".into();
/// assert_eq!(id.to_string(), "\"req-123\"");
/// assert_eq!(Id::Number(7).to_string(), "7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier, used for every request this crate sends
    String(String),
    /// Numeric identifier
    Number(i64),
    /// Null identifier
    Null,
}

impl Id {
    /// Generate a fresh, random correlation token
    ///
    /// Each call gets its own token. It is never reused and never matched
    /// against anything but the reply to the same HTTP exchange.
    pub fn random() -> Self {
        Id::String(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

/// JSON-RPC 2.0 request envelope
///
/// `params` is skipped on the wire when `None`; `uac.reg_dump` for example
/// takes no parameters at all.
///
/// ```rust
/// use kamrpc_core::{Id, JsonRpcRequest};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new("htable.dump", Some(json!({"htable": "users"})), Id::from("1"));
/// assert_eq!(req.jsonrpc, "2.0");
/// assert_eq!(req.method, "htable.dump");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest<P = serde_json::Value> {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Upstream method name, e.g. `dispatcher.list`
    pub method: String,
    /// Method-specific parameter object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
    /// Correlation token for this exchange
    pub id: Id,
}

impl<P> JsonRpcRequest<P> {
    /// Create a request envelope; `jsonrpc` is set to "2.0"
    pub fn new(method: impl Into<String>, params: Option<P>, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response envelope
///
/// Success and error replies share this shape. They are told apart only by
/// the error code: a present `error` whose `code` is zero still counts as
/// success (see [`JsonRpcErrorData::is_error`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse<R = serde_json::Value> {
    /// Protocol version as echoed by the upstream
    pub jsonrpc: Option<String>,
    /// Method-specific result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    /// Error object, if the upstream attached one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    /// Correlation token as echoed by the upstream
    pub id: Option<Id>,
}

impl<R> JsonRpcResponse<R> {
    /// Build a success reply
    pub fn success(result: R, id: Id) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    /// Build an error reply
    pub fn failure(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            result: None,
            error: Some(error),
            id: Some(id),
        }
    }

    /// The embedded error, but only if its code is non-zero
    pub fn rpc_error(&self) -> Option<&JsonRpcErrorData> {
        self.error.as_ref().filter(|e| e.is_error())
    }

    /// True when no non-zero error code is present
    pub fn is_success(&self) -> bool {
        self.rpc_error().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_random_ids_differ() {
        let a = Id::random();
        let b = Id::random();
        assert_ne!(a, b);
        assert!(matches!(a, Id::String(ref s) if s.len() == 36));
    }

    #[test]
    fn test_request_serialization() {
        let req = JsonRpcRequest::new(
            "htable.get",
            Some(serde_json::json!({"htable": "t", "key": "k"})),
            Id::from("abc"),
        );
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"htable.get\""));
        assert!(json.contains("\"id\":\"abc\""));
        assert!(json.contains("\"htable\":\"t\""));
    }

    #[test]
    fn test_request_without_params_omits_field() {
        let req: JsonRpcRequest = JsonRpcRequest::new("uac.reg_dump", None, Id::from("x"));
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_response_without_id_or_version() {
        let resp: JsonRpcResponse = serde_json::from_str(r#"{"result": 3}"#).unwrap();
        assert!(resp.id.is_none());
        assert!(resp.jsonrpc.is_none());
        assert_eq!(resp.result, Some(serde_json::json!(3)));
        assert!(resp.is_success());
    }

    #[test]
    fn test_zero_code_error_is_success() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","error":{"code":0,"message":""},"id":"1"}"#)
                .unwrap();
        assert!(resp.error.is_some());
        assert!(resp.is_success());
        assert!(resp.rpc_error().is_none());
    }

    #[test]
    fn test_success_constructor() {
        let resp = JsonRpcResponse::success(serde_json::json!([1]), Id::from("1"));
        assert!(resp.is_success());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            serde_json::json!({"jsonrpc": "2.0", "result": [1], "id": "1"})
        );
    }

    #[test]
    fn test_failure_constructor() {
        let resp: JsonRpcResponse<()> =
            JsonRpcResponse::failure(JsonRpcErrorData::new(500, "boom"), Id::from("1"));
        assert!(!resp.is_success());
        assert_eq!(resp.rpc_error().map(|e| e.code), Some(500));
    }
}
