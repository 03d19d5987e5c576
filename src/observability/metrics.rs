//! Request metrics.
//!
//! # Metrics
//! - `onion_requests_total` (counter): finished requests by method, status
//! - `onion_request_duration_seconds` (histogram): time from dispatch to terminal write
//! - `onion_errors_total` (counter): errors routed to the error handler, by kind
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no exporter is installed here,
//!   so without a recorder every call is a no-op
//! - Labels stay low-cardinality (no paths)

use std::time::Instant;

const METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Label for `method`; extension methods collapse into `"other"`.
pub fn method_label(method: &str) -> &'static str {
    METHODS
        .iter()
        .find(|known| **known == method)
        .copied()
        .unwrap_or("other")
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    let method = method_label(method);
    metrics::counter!(
        "onion_requests_total",
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("onion_request_duration_seconds", "method" => method)
        .record(elapsed);
}

/// Record an error handled by the application.
pub fn record_error(kind: &'static str) {
    metrics::counter!("onion_errors_total", "kind" => kind).increment(1);
}
