//! Metrics collection and exposition.
//!
//! # Metrics
//! - `preview_rule_matches_total` (counter): requests resolved to a rule, by action
//! - `preview_proxy_requests_total` (counter): proxied requests, by outcome
//! - `preview_proxy_duration_seconds` (histogram): upstream latency
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder the calls are no-ops
//! - Prometheus exposition is opt-in

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::routing::Action;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a request that resolved to a rule.
pub fn record_rule_match(action: Action) {
    metrics::counter!("preview_rule_matches_total", "action" => action.as_str()).increment(1);
}

/// Record one proxied request.
pub fn record_proxy(outcome: &'static str, start: Instant) {
    metrics::counter!("preview_proxy_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("preview_proxy_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}
