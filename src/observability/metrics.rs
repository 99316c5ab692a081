//! Metrics collection and exposition.
//!
//! # Metrics
//! - `trustedcoin_source_attempts_total` (counter): attempts by operation, source kind, outcome
//! - `trustedcoin_verification_failures_total` (counter): rejected blocks by failure kind
//! - `trustedcoin_operation_duration_seconds` (histogram): end-to-end engine operation latency
//! - `trustedcoin_trust_cache_entries` (gauge): heights currently trusted
//!
//! # Design Decisions
//! - Source labels are kinds ("esplora"), never URLs, to keep cardinality low
//! - Exporter is only installed when enabled in config

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// One attempt against one source.
pub fn record_attempt(operation: &'static str, source: &'static str, outcome: &'static str) {
    metrics::counter!(
        "trustedcoin_source_attempts_total",
        "operation" => operation,
        "source" => source,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_verification_failure(kind: &'static str) {
    metrics::counter!("trustedcoin_verification_failures_total", "kind" => kind).increment(1);
}

/// Latency of a whole engine operation started at `started`.
pub fn record_operation(operation: &'static str, started: Instant) {
    metrics::histogram!("trustedcoin_operation_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_trust_cache_size(entries: usize) {
    metrics::gauge!("trustedcoin_trust_cache_entries").set(entries as f64);
}
