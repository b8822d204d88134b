//! Prometheus metrics for the lobby gateway.
//!
//! Exposed in Prometheus text format on `METRICS_BIND` when configured.
//! Without an installed recorder every call below is a no-op, which is what
//! the tests rely on.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Seating Metrics
// ============================================================================

/// Record the outcome of a join or leave, labelled by error kind on failure.
pub fn seating_operations_total(operation: &'static str, outcome: &str) {
    metrics::counter!("seating_operations_total",
        "operation" => operation,
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: usize) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Count room events queued for delivery.
pub fn room_events_fanned_out(kind: &str, recipients: usize) {
    metrics::counter!("room_events_fanned_out_total",
        "kind" => kind.to_string()
    )
    .increment(recipients as u64);
}
