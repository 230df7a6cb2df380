//! REST facade metrics
//!
//! OpenTelemetry instruments for the inbound side of the gateway. The
//! upstream side is measured by `kamrpc_client::ClientMetrics`.
//!
//! # Metrics Collected
//!
//! - **requests_total**: REST requests answered, by HTTP method and status (counter)
//! - **request_duration**: time to answer, in seconds (histogram)
//! - **errors_total**: replies with a 4xx or 5xx status (counter)
//!
//! Instruments are created through `opentelemetry::global`; they are
//! exported only when observability was initialized with an OTLP endpoint.

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Metrics for the REST facade, prefixed `kamrpc.server.*`
pub struct ServerMetrics {
    /// Total number of requests answered
    pub requests_total: Counter<u64>,
    /// Request duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of error replies
    pub errors_total: Counter<u64>,
}

impl ServerMetrics {
    /// Create metrics on the global meter provider
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("kamrpc.server.requests.total")
                .with_description("Total number of REST requests answered")
                .build(),
            request_duration: meter
                .f64_histogram("kamrpc.server.request.duration")
                .with_description("REST request duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("kamrpc.server.errors.total")
                .with_description("Total number of REST error replies")
                .build(),
        }
    }

    /// Record one answered request
    pub fn record_request(&self, method: &str, status: u16, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", i64::from(status)),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);

        if status >= 400 {
            self.errors_total.add(1, attributes);
        }
    }
}
