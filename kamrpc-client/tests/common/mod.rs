//! Common test utilities for kamrpc-client integration tests
//!
//! [`MockUpstream`] is a small warp server standing in for the SIP proxy's
//! JSON-RPC endpoint. Every POST to `/RPC` is recorded and answered by a
//! script that picks the status and body from the decoded envelope.

#![allow(dead_code)]

use kamrpc_core::{Id, JsonRpcErrorData, JsonRpcResponse};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use warp::http::{HeaderMap, Response};
use warp::hyper::body::Bytes;
use warp::Filter;

/// Scripted reply: status code and raw body
pub type Reply = (u16, String);

type Script = Arc<dyn Fn(&Value) -> Reply + Send + Sync>;

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct Recorded {
    /// Decoded envelope, `Value::Null` if the body was not JSON
    pub envelope: Value,
    /// `Content-Type` header
    pub content_type: Option<String>,
    /// `Connection` header
    pub connection: Option<String>,
}

impl Recorded {
    pub fn method(&self) -> &str {
        self.envelope["method"].as_str().unwrap_or_default()
    }

    pub fn params(&self) -> &Value {
        &self.envelope["params"]
    }
}

/// Mock JSON-RPC upstream on an ephemeral port
pub struct MockUpstream {
    addr: SocketAddr,
    recorded: Arc<Mutex<Vec<Recorded>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    /// Start a mock answering every call with `script`
    pub async fn start<F>(script: F) -> Self
    where
        F: Fn(&Value) -> Reply + Send + Sync + 'static,
    {
        Self::start_with_delay(Duration::ZERO, script).await
    }

    /// Start a mock that waits `delay` before answering
    pub async fn start_with_delay<F>(delay: Duration, script: F) -> Self
    where
        F: Fn(&Value) -> Reply + Send + Sync + 'static,
    {
        let script: Script = Arc::new(script);
        let recorded = Arc::new(Mutex::new(Vec::new()));
        let log = recorded.clone();

        let route = warp::post()
            .and(warp::path("RPC"))
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and_then(move |headers: HeaderMap, body: Bytes| {
                let script = script.clone();
                let log = log.clone();
                async move {
                    let envelope = serde_json::from_slice(&body).unwrap_or(Value::Null);
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    log.lock().unwrap().push(Recorded {
                        envelope: envelope.clone(),
                        content_type: header("content-type"),
                        connection: header("connection"),
                    });

                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }

                    let (status, body) = script(&envelope);
                    Ok::<_, warp::Rejection>(Response::builder().status(status).body(body).unwrap())
                }
            });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (addr, server) =
            warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                shutdown_rx.await.ok();
            });
        tokio::spawn(server);

        Self {
            addr,
            recorded,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// JSON-RPC URL of this mock
    pub fn url(&self) -> String {
        format!("http://{}/RPC", self.addr)
    }

    /// Requests received so far
    pub fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    /// Methods received so far, in order
    pub fn methods(&self) -> Vec<String> {
        self.recorded().iter().map(|r| r.method().to_string()).collect()
    }

    /// Shutdown the mock
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A 200 reply carrying `result`
pub fn ok(result: Value) -> Reply {
    let envelope = JsonRpcResponse::success(result, Id::from("1"));
    (200, serde_json::to_string(&envelope).unwrap())
}

/// A reply with `status` carrying an error envelope
pub fn error(status: u16, code: i64, message: &str) -> Reply {
    let envelope: JsonRpcResponse =
        JsonRpcResponse::failure(JsonRpcErrorData::new(code, message), Id::from("1"));
    (status, serde_json::to_string(&envelope).unwrap())
}

/// Address nothing listens on
pub async fn refused_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/RPC", addr)
}
