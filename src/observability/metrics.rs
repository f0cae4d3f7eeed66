//! Metrics collection and exposition.
//!
//! # Metrics
//! - `collector_spans_received_total` (counter): spans accepted, by format
//! - `collector_spans_rejected_total` (counter): spans dropped by validation, by format
//! - `collector_batches_received_total` (counter): batches by format and transport
//! - `collector_rpc_calls_total` (counter): RPC calls by service, method, outcome
//! - `collector_http_panics_recovered_total` (counter): handler panics by front-end
//! - `collector_health_status` (gauge): 0=unavailable, 1=ready, 2=failed
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::HealthStatus;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_spans(format: &'static str, accepted: usize, rejected: usize) {
    counter!("collector_spans_received_total", "format" => format).increment(accepted as u64);
    if rejected > 0 {
        counter!("collector_spans_rejected_total", "format" => format)
            .increment(rejected as u64);
    }
}

pub fn record_batch(format: &'static str, transport: &'static str) {
    counter!(
        "collector_batches_received_total",
        "format" => format,
        "transport" => transport
    )
    .increment(1);
}

pub fn record_rpc_call(service: &str, method: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "collector_rpc_calls_total",
        "service" => service.to_string(),
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_panic_recovered(frontend: &'static str) {
    counter!("collector_http_panics_recovered_total", "frontend" => frontend).increment(1);
}

pub fn record_health_status(status: HealthStatus) {
    let value = match status {
        HealthStatus::Unavailable => 0.0,
        HealthStatus::Ready => 1.0,
        HealthStatus::Failed => 2.0,
    };
    gauge!("collector_health_status").set(value);
}
