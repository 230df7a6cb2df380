//! Client metrics definitions
//!
//! OpenTelemetry instruments for upstream calls. They are created against
//! the global meter provider, so they export only once
//! `kamrpc_core::init_observability` has installed an OTLP pipeline, and
//! are no-ops otherwise.
//!
//! # Metrics Collected
//!
//! - **requests_total**: upstream calls by method and outcome (counter)
//! - **request_duration**: upstream call latency in seconds (histogram)
//! - **errors_total**: failed calls by error kind (counter)
//! - **bulk_delete_keys**: keys touched by delete-by-query, by outcome (counter)
//!
//! ```rust,no_run
//! use kamrpc_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new("kamrpc-gateway");
//! metrics.record_request("htable.dump", "success", 0.012);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};

/// Instruments recorded by [`KamailioClient`](crate::KamailioClient)
pub struct ClientMetrics {
    /// Total number of upstream calls
    pub requests_total: Counter<u64>,
    /// Upstream call duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of failed calls
    pub errors_total: Counter<u64>,
    /// Keys processed by bulk delete-by-query
    pub bulk_delete_keys: Counter<u64>,
}

impl ClientMetrics {
    /// Create metrics on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        // global::meter wants a 'static name; this runs once per process.
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create metrics on a caller-supplied meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("kamrpc.client.requests.total")
                .with_description("Total number of upstream JSON-RPC calls")
                .build(),
            request_duration: meter
                .f64_histogram("kamrpc.client.request.duration")
                .with_description("Upstream JSON-RPC call duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("kamrpc.client.errors.total")
                .with_description("Total number of failed upstream calls by kind")
                .build(),
            bulk_delete_keys: meter
                .u64_counter("kamrpc.client.bulk_delete.keys")
                .with_description("Keys processed by delete-by-query, by outcome")
                .build(),
        }
    }

    /// Record one upstream call
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record a failed call by error kind
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record the outcome of one delete-by-query run
    pub fn record_bulk_delete(&self, deleted: u64, failed: u64) {
        self.bulk_delete_keys
            .add(deleted, &[KeyValue::new("outcome", "deleted")]);
        self.bulk_delete_keys
            .add(failed, &[KeyValue::new("outcome", "failed")]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = ClientMetrics::new("test-client");

        metrics.record_request("htable.get", "success", 0.05);
        metrics.record_request("htable.get", "error", 0.01);
        metrics.record_error("timeout");
        metrics.record_bulk_delete(3, 1);
    }

    #[test]
    fn test_metrics_with_meter() {
        let meter = global::meter("test-client-meter");
        let metrics = ClientMetrics::new_with_meter(&meter);

        metrics.record_error("rpc");
        metrics.record_bulk_delete(0, 0);
    }
}
