//! Codec for JSON-RPC envelopes
//!
//! Turns request envelopes into bytes for the HTTP body and turns reply
//! bodies back into either a typed result or an [`Error`].
//!
//! # Error detection
//!
//! RPC-level failure is decided by the `error.code` member alone, never by
//! the HTTP status. [`parse_error`] reports a non-zero code as `Some`, a
//! missing or zero code as `None`, and bytes that are not a JSON object as
//! `Err(Error::Decode)`, so "no error" and "could not tell" stay distinct.
//!
//! [`decode_result`] is the success-path decoder: it checks for an embedded
//! error first (upstreams may answer 200 with an error inside) and only then
//! decodes `result` into the caller's type.
//!
//! # Examples
//!
//! ```rust
//! use kamrpc_core::{codec, Error};
//!
//! let body = br#"{"jsonrpc":"2.0","error":{"code":501,"message":"no such table"},"id":"1"}"#;
//! let err = codec::parse_error(body).unwrap().unwrap();
//! assert_eq!(err.code, 501);
//!
//! let ok = br#"{"jsonrpc":"2.0","result":{"entry":1},"id":"1"}"#;
//! let value: Option<serde_json::Value> = codec::decode_result(ok).unwrap();
//! assert_eq!(value.unwrap()["entry"], 1);
//!
//! assert!(matches!(codec::parse_error(b"<html>"), Err(Error::Decode(_))));
//! ```

use crate::error::{Error, JsonRpcErrorData, Result};
use crate::types::{JsonRpcRequest, JsonRpcResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Encode any serializable value to JSON bytes
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a request envelope for the HTTP body
///
/// Only fails when the params type refuses to serialize, which the
/// adapters' plain structs never do.
///
/// ```rust
/// use kamrpc_core::{codec, Id, JsonRpcRequest};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new("htable.flush", Some(json!({"htable": "t"})), Id::from("7"));
/// let bytes = codec::encode_request(&req).unwrap();
/// let text = String::from_utf8(bytes).unwrap();
/// assert!(text.contains("\"method\":\"htable.flush\""));
/// ```
pub fn encode_request<P: Serialize>(req: &JsonRpcRequest<P>) -> Result<Vec<u8>> {
    encode(req)
}

/// Best-effort view of any reply, used only to find the error member
#[derive(Deserialize)]
struct ErrorProbe {
    #[serde(default)]
    error: Option<JsonRpcErrorData>,
}

/// Extract the RPC error carried by a reply body, if any
///
/// - `Ok(None)`: no `error` member, or its `code` is zero
/// - `Ok(Some(e))`: non-zero error code
/// - `Err(Error::Decode)`: the body is not a JSON object
pub fn parse_error(data: &[u8]) -> Result<Option<JsonRpcErrorData>> {
    let probe: ErrorProbe =
        serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(probe.error.filter(|e| e.is_error()))
}

/// Decode a full response envelope with a typed result
pub fn decode_response<R: DeserializeOwned>(data: &[u8]) -> Result<JsonRpcResponse<R>> {
    serde_json::from_slice(data).map_err(|e| Error::Decode(e.to_string()))
}

/// Decode the `result` member of a reply into `R`
///
/// An embedded non-zero error wins over any result and comes back as
/// `Error::Rpc`. A missing or `null` result decodes to `None`.
pub fn decode_result<R: DeserializeOwned>(data: &[u8]) -> Result<Option<R>> {
    // Keep `result` raw so a result that does not match `R` cannot hide an
    // embedded error.
    let response: JsonRpcResponse<Box<RawValue>> = decode_response(data)?;
    if let Some(error) = response.rpc_error() {
        return Err(Error::Rpc(error.clone()));
    }
    match response.result {
        Some(raw) => serde_json::from_str(raw.get())
            .map(Some)
            .map_err(|e| Error::Decode(e.to_string())),
        None => Ok(None),
    }
}
