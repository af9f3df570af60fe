//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatcher_requests_total` (counter): requests answered, by mode and status
//! - `dispatcher_payloads_written_total` (counter): appended records, by file
//! - `dispatcher_capture_skipped_total` (counter): vetoed captures, by reason
//! - `dispatcher_errors_total` (counter): reported errors, by kind
//! - `dispatcher_upstream_duration_seconds` (histogram): upstream call latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            metrics::describe_counter!(
                "dispatcher_requests_total",
                "Requests answered by the dispatcher"
            );
            metrics::describe_counter!(
                "dispatcher_payloads_written_total",
                "Payload records appended to disk"
            );
            metrics::describe_counter!(
                "dispatcher_capture_skipped_total",
                "Captures vetoed before formatting"
            );
            metrics::describe_counter!("dispatcher_errors_total", "Errors reported by the pipeline");
            metrics::describe_histogram!(
                "dispatcher_upstream_duration_seconds",
                "Latency of upstream calls"
            );
            tracing::info!(address = %addr, "Metrics endpoint listening");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(mode: &'static str, status: u16) {
    metrics::counter!(
        "dispatcher_requests_total",
        "mode" => mode,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_payload(file: &'static str) {
    metrics::counter!("dispatcher_payloads_written_total", "file" => file).increment(1);
}

pub fn record_skip(reason: &'static str) {
    metrics::counter!("dispatcher_capture_skipped_total", "reason" => reason).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("dispatcher_errors_total", "kind" => kind).increment(1);
}

pub fn record_upstream_latency(start: Instant) {
    metrics::histogram!("dispatcher_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}
