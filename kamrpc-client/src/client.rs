//! JSON-RPC client for the upstream control interface
//!
//! [`KamailioClient`] turns one method call into one HTTP exchange and
//! classifies the outcome into the three failure tiers:
//!
//! 1. **Transport**: no reply at all (connect error, timeout). Surfaced
//!    immediately, never retried.
//! 2. **Non-200 status**: the body is read as an error envelope and its
//!    error is returned. Some methods read a 404 differently, see
//!    [`NotFoundPolicy`].
//! 3. **200 with an embedded error**: a non-zero `error.code` inside a 200
//!    reply is still an RPC failure.
//!
//! The method adapters (`dispatcher_*`, `htable_*`, registration calls) are
//! inherent methods defined in their own modules on top of [`call`].
//!
//! # Cloning
//!
//! `KamailioClient` is cheap to clone; clones share the transport and the
//! metrics. It holds no per-call state, so concurrent callers never
//! contend on anything but the transport itself.
//!
//! [`call`]: KamailioClient::call

use crate::transport::{Transport, TransportResponse};
use crate::{ClientBuilder, ClientMetrics};
use kamrpc_core::{codec, Error, Id, JsonRpcRequest, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// How an upstream HTTP 404 is read for one method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotFoundPolicy {
    /// 404 is a failure like any other non-200 status
    #[default]
    Fail,
    /// 404 becomes `Error::NotFound`
    Report,
    /// 404 means there was nothing to do: success without a result
    Absorb,
}

/// JSON-RPC client over an HTTP [`Transport`]
#[derive(Clone)]
pub struct KamailioClient {
    transport: Arc<dyn Transport>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl KamailioClient {
    /// Create a client over an existing transport, without metrics
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            metrics: None,
        }
    }

    /// Start building a client for an upstream URL
    pub fn builder(url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(url)
    }

    /// Attach metrics recorded on every call
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Metrics attached to this client, if any
    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_deref()
    }

    /// Upstream endpoint, for logs
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Call an upstream method and decode its result
    ///
    /// Returns `Ok(None)` when the reply carries no `result` member.
    pub async fn call<P, R>(&self, method: &str, params: Option<P>) -> Result<Option<R>>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        self.call_with(method, params, NotFoundPolicy::Fail).await
    }

    /// Call an upstream method with an explicit reading of HTTP 404
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call_with<P, R>(
        &self,
        method: &str,
        params: Option<P>,
        not_found: NotFoundPolicy,
    ) -> Result<Option<R>>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let start = Instant::now();
        let outcome = self
            .exchange(method, params)
            .await
            .and_then(|response| interpret(method, &response, not_found));
        self.observe(method, start, outcome)
    }

    /// Call an upstream method whose result is not needed
    ///
    /// Any HTTP 200 without a non-zero error code is success, even when the
    /// body is empty or not JSON.
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call_unit<P>(
        &self,
        method: &str,
        params: Option<P>,
        not_found: NotFoundPolicy,
    ) -> Result<()>
    where
        P: Serialize + Send,
    {
        let start = Instant::now();
        let outcome = self
            .exchange(method, params)
            .await
            .and_then(|response| interpret_unit(method, &response, not_found));
        self.observe(method, start, outcome)
    }

    async fn exchange<P>(&self, method: &str, params: Option<P>) -> Result<TransportResponse>
    where
        P: Serialize + Send,
    {
        let body = {
            let request = JsonRpcRequest::new(method, params, Id::random());
            tracing::debug!(id = %request.id, endpoint = self.endpoint(), "Sending request");
            codec::encode_request(&request)?
        };

        self.transport.post(body).await
    }

    fn observe<T>(&self, method: &str, start: Instant, outcome: Result<T>) -> Result<T> {
        let duration = start.elapsed().as_secs_f64();

        match &outcome {
            Ok(_) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, "success", duration);
                }
                tracing::debug!(duration_secs = duration, "Call completed");
            }
            Err(e) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, "error", duration);
                    m.record_error(e.kind());
                }
                tracing::error!(error = %e, kind = e.kind(), "Call failed");
            }
        }

        outcome
    }
}

/// Classify a raw reply into a decoded result or an error
pub(crate) fn interpret<R: DeserializeOwned>(
    method: &str,
    response: &TransportResponse,
    not_found: NotFoundPolicy,
) -> Result<Option<R>> {
    if response.is_ok() {
        return codec::decode_result(&response.body);
    }
    non_success(method, response, not_found).map(|()| None)
}

/// Classify a raw reply whose result is ignored
pub(crate) fn interpret_unit(
    method: &str,
    response: &TransportResponse,
    not_found: NotFoundPolicy,
) -> Result<()> {
    if response.is_ok() {
        return match codec::parse_error(&response.body) {
            Ok(Some(error)) => Err(Error::Rpc(error)),
            Ok(None) | Err(_) => Ok(()),
        };
    }
    non_success(method, response, not_found)
}

/// Non-200 reply; `Ok` only when a 404 is absorbed
fn non_success(method: &str, response: &TransportResponse, not_found: NotFoundPolicy) -> Result<()> {
    if response.status == 404 {
        match not_found {
            NotFoundPolicy::Absorb => {
                tracing::debug!(method, "Upstream reported not found; nothing to do");
                return Ok(());
            }
            NotFoundPolicy::Report => return Err(Error::NotFound(method.to_string())),
            NotFoundPolicy::Fail => {}
        }
    }

    tracing::debug!(method, status = response.status, "Unexpected status code");
    match codec::parse_error(&response.body) {
        Ok(Some(error)) => Err(Error::Rpc(error)),
        // An unreadable or code-less body still must not pass as success.
        Ok(None) | Err(_) => Err(Error::UnexpectedStatus {
            status: response.status,
        }),
    }
}
