//! Metrics collection and exposition.
//!
//! # Metrics
//! - `alert_watcher_lines_total` (counter): raw lines read from the log
//! - `alert_watcher_parse_failures_total` (counter): malformed lines, by reason
//! - `alert_watcher_alerts_total` (counter): candidates by type and outcome
//! - `alert_watcher_log_reopens_total` (counter): rotations and truncations
//! - `alert_watcher_error_rate` (gauge): current window error fraction
//! - `alert_watcher_window_fill` (gauge): entries currently in the window

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::alerting::types::AlertKind;

/// Install the Prometheus recorder with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_line() {
    metrics::counter!("alert_watcher_lines_total").increment(1);
}

pub fn record_parse_failure(reason: &'static str) {
    metrics::counter!("alert_watcher_parse_failures_total", "reason" => reason).increment(1);
}

pub fn record_alert(kind: AlertKind, outcome: &'static str) {
    metrics::counter!(
        "alert_watcher_alerts_total",
        "type" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_log_reopen(reason: &'static str) {
    metrics::counter!("alert_watcher_log_reopens_total", "reason" => reason).increment(1);
}

pub fn set_error_rate(fraction: f64) {
    metrics::gauge!("alert_watcher_error_rate").set(fraction);
}

pub fn set_window_fill(len: usize) {
    metrics::gauge!("alert_watcher_window_fill").set(len as f64);
}
