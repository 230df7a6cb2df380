//! Common test utilities for kamrpc-server integration tests
//!
//! [`ScriptedTransport`] replaces HTTP entirely: every envelope the client
//! sends is recorded and answered by a script, so route tests run without
//! sockets.

#![allow(dead_code)]

use async_trait::async_trait;
use kamrpc_client::{ClientBuilder, Transport, TransportResponse};
use kamrpc_core::{Id, JsonRpcErrorData, JsonRpcResponse, Result};
use kamrpc_server::GatewayServer;
use serde_json::Value;
use std::sync::{Arc, Mutex};

type Script = Box<dyn Fn(&Value) -> (u16, String) + Send + Sync>;

/// In-memory upstream answering from a script
pub struct ScriptedTransport {
    script: Script,
    sent: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&Value) -> (u16, String) + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Envelopes sent so far
    pub fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    /// Methods sent so far, in order
    pub fn methods(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|e| e["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, body: Vec<u8>) -> Result<TransportResponse> {
        let envelope: Value = serde_json::from_slice(&body).unwrap();
        let (status, reply) = (self.script)(&envelope);
        self.sent.lock().unwrap().push(envelope);
        Ok(TransportResponse::new(status, reply))
    }

    fn endpoint(&self) -> &str {
        "scripted://upstream"
    }
}

/// Server whose client talks to `transport`
pub fn server(transport: Arc<ScriptedTransport>) -> GatewayServer {
    let client = ClientBuilder::new("scripted://upstream")
        .with_transport(transport)
        .build()
        .unwrap();
    GatewayServer::builder().client(client).build().unwrap()
}

/// A 200 reply carrying `result`
pub fn ok(result: Value) -> (u16, String) {
    let envelope = JsonRpcResponse::success(result, Id::from("1"));
    (200, serde_json::to_string(&envelope).unwrap())
}

/// A reply with `status` carrying an error envelope
pub fn error(status: u16, code: i64, message: &str) -> (u16, String) {
    let envelope: JsonRpcResponse =
        JsonRpcResponse::failure(JsonRpcErrorData::new(code, message), Id::from("1"));
    (status, serde_json::to_string(&envelope).unwrap())
}
