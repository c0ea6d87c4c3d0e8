//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_sessions_total` (counter): finished sessions by outcome
//! - `proxy_cache_lookups_total` (counter): lookups by result (hit/miss)
//! - `proxy_origin_requests_total` (counter): origin round trips by result
//! - `proxy_origin_request_duration_seconds` (histogram): origin latency
//! - `proxy_cache_entries` (gauge): number of cached keys
//! - `proxy_active_connections` (gauge): live client sessions

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_session(outcome: &'static str) {
    metrics::counter!("proxy_sessions_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("proxy_cache_lookups_total", "result" => result).increment(1);
}

pub fn record_origin_request(ok: bool, start: Instant) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("proxy_origin_requests_total", "result" => result).increment(1);
    metrics::histogram!("proxy_origin_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("proxy_cache_entries").set(entries as f64);
}

pub fn record_active_connections(count: u64) {
    metrics::gauge!("proxy_active_connections").set(count as f64);
}
