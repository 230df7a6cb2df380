//! HTTP transport to the upstream control endpoint
//!
//! The upstream speaks JSON-RPC over plain HTTP: one POST per call, one
//! reply body per POST. [`Transport`] is the seam between the client and
//! the wire so adapters can be exercised against a scripted peer.
//!
//! [`HttpTransport`] is the production implementation:
//!
//! - POSTs to a single configured URL with `Content-Type: application/json`
//! - sends `Connection: close` and keeps no idle connections, so every call
//!   opens a fresh connection
//! - bounds each call by a timeout; an expired call fails as
//!   [`Error::Timeout`]
//!
//! Nothing here looks at the reply body. Status and bytes are handed back
//! as-is and the client decides what they mean.

use async_trait::async_trait;
use kamrpc_core::{Error, Result};
use reqwest::header::{CONNECTION, CONTENT_TYPE};
use std::time::Duration;

/// Default bound on one upstream call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw reply from the upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Full reply body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Create a reply from status and body bytes
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for HTTP 200, the only status the upstream uses for success
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// One request/response exchange with the upstream
///
/// Implementations must be safe to share between concurrent callers and
/// must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one encoded envelope and return the raw reply
    ///
    /// Fails only when no reply was obtained (connect error, timeout,
    /// unreadable body). Non-200 statuses are returned, not raised.
    async fn post(&self, body: Vec<u8>) -> Result<TransportResponse>;

    /// Endpoint this transport talks to, for logs
    fn endpoint(&self) -> &str;
}

/// reqwest-backed [`Transport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport posting to `url`, each call bounded by `timeout`
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` when the URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        reqwest::Url::parse(&url)
            .map_err(|e| Error::InvalidConfig(format!("upstream url {:?}: {}", url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    /// Configured per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: Vec<u8>) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(CONNECTION, "close")
            .body(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(from_reqwest)?;

        Ok(TransportResponse::new(status, body.to_vec()))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(e.to_string())
    }
}
