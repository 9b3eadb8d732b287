//! Dispatch metrics.
//!
//! Metrics go through the `metrics` facade. Installing an exporter is up to
//! the host; without one every call here is a no-op.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `accord_requests_total` | Counter | `route`, `status` |
//! | `accord_request_validation_failures_total` | Counter | `route`, `part` |
//! | `accord_response_validation_failures_total` | Counter | `route` |
//! | `accord_request_duration_seconds` | Histogram | `route` |
//! | `accord_in_flight_requests` | Gauge | - |

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Requests served, by route key and status.
pub const REQUESTS_TOTAL: &str = "accord_requests_total";
/// Request validation failures, by route key and request part.
pub const REQUEST_VALIDATION_FAILURES_TOTAL: &str = "accord_request_validation_failures_total";
/// Response validation failures, by route key.
pub const RESPONSE_VALIDATION_FAILURES_TOTAL: &str = "accord_response_validation_failures_total";
/// Dispatch latency, by route key.
pub const REQUEST_DURATION_SECONDS: &str = "accord_request_duration_seconds";
/// Requests currently being served by the transport adapter.
pub const IN_FLIGHT_REQUESTS: &str = "accord_in_flight_requests";

/// Registers descriptions for every metric above with the installed recorder.
///
/// Call once after installing an exporter.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of requests dispatched");
    describe_counter!(
        REQUEST_VALIDATION_FAILURES_TOTAL,
        "Requests rejected because a part failed validation"
    );
    describe_counter!(
        RESPONSE_VALIDATION_FAILURES_TOTAL,
        "Handler responses that broke the route's response contract"
    );
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Time from match to serialized response, in seconds"
    );
    describe_gauge!(IN_FLIGHT_REQUESTS, "Requests currently being served");
}

/// Records a dispatched request.
///
/// Unmatched requests are recorded with an empty route label.
pub fn record_request(route: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "route" => route.to_string())
        .record(duration.as_secs_f64());
}

/// Records one failing request part (`path_params`, `headers`, `query`, `body`).
pub fn record_request_validation_failure(route: &str, part: &str) {
    counter!(
        REQUEST_VALIDATION_FAILURES_TOTAL,
        "route" => route.to_string(),
        "part" => part.to_string()
    )
    .increment(1);
}

/// Records a response that failed validation or used an undeclared status.
pub fn record_response_validation_failure(route: &str) {
    counter!(RESPONSE_VALIDATION_FAILURES_TOTAL, "route" => route.to_string()).increment(1);
}

/// Guard that tracks one in-flight request.
///
/// Increments [`IN_FLIGHT_REQUESTS`] on creation and decrements it on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}
