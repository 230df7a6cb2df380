//! Gateway configuration
//!
//! Settings are read from the environment once at startup into a
//! [`GatewayConfig`] value that is then passed around explicitly.
//!
//! | variable | default |
//! |---|---|
//! | `HTTP_LISTEN_ADDR` | `127.0.0.1:8080` |
//! | `KAMAILIO_SERVER_ADDR` | `localhost:8081` |
//! | `KAMAILIO_JSONRPC_URL` | `http://<KAMAILIO_SERVER_ADDR>/RPC` |
//! | `KAMAILIO_RPC_TIMEOUT_MS` | `5000` |
//! | `LOG_LEVEL` | `info` |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | unset |

use kamrpc_core::observability::DEFAULT_SERVICE_NAME;
use kamrpc_core::{Error, ObservabilityConfig, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_UPSTREAM_ADDR: &str = "localhost:8081";
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings of the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// REST listen socket
    pub listen_addr: SocketAddr,
    /// Full JSON-RPC URL of the upstream
    pub upstream_url: String,
    /// Bound on one upstream call
    pub rpc_timeout: Duration,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// OTLP collector; `None` keeps telemetry local
    pub otlp_endpoint: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            upstream_url: upstream_url(DEFAULT_UPSTREAM_ADDR),
            rpc_timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            otlp_endpoint: None,
        }
    }
}

impl GatewayConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let listen = var("HTTP_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen.parse().map_err(|e| {
            Error::InvalidConfig(format!("HTTP_LISTEN_ADDR {:?}: {}", listen, e))
        })?;

        let upstream_url = match var("KAMAILIO_JSONRPC_URL") {
            Some(url) => url,
            None => upstream_url(
                &var("KAMAILIO_SERVER_ADDR").unwrap_or_else(|| DEFAULT_UPSTREAM_ADDR.to_string()),
            ),
        };

        let rpc_timeout = match var("KAMAILIO_RPC_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(Error::InvalidConfig(format!(
                        "KAMAILIO_RPC_TIMEOUT_MS {:?}: expected a positive number of milliseconds",
                        raw
                    )))
                }
            },
            None => Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
        };

        Ok(Self {
            listen_addr,
            upstream_url,
            rpc_timeout,
            log_level: var("LOG_LEVEL")
                .map(|l| l.to_ascii_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            otlp_endpoint: var("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// Observability settings derived from this configuration
    pub fn observability(&self) -> ObservabilityConfig {
        let config = ObservabilityConfig::new(DEFAULT_SERVICE_NAME)
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_log_level(&self.log_level);

        match &self.otlp_endpoint {
            Some(endpoint) => config.with_endpoint(endpoint),
            None => config.without_export(),
        }
    }
}

fn upstream_url(addr: &str) -> String {
    format!("http://{}/RPC", addr)
}
