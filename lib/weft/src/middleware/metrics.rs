//! Metrics middleware using the metrics crate facade.
//!
//! Records HTTP request/response metrics using the `metrics` crate, which
//! allows integration with various metrics backends (Prometheus, `StatsD`, etc.).

use std::time::Instant;

use crate::{BoxFuture, Interceptor, Next, Request, Response, Result};

const LABEL_METHOD: &str = "method";
const LABEL_STATUS: &str = "status";

/// Total number of requests, labeled by method and status.
pub const METRIC_REQUESTS_TOTAL: &str = "http_client_requests_total";
/// Request duration in seconds, labeled by method.
pub const METRIC_REQUEST_DURATION: &str = "http_client_request_duration_seconds";
/// Number of requests currently in flight.
pub const METRIC_REQUESTS_IN_FLIGHT: &str = "http_client_requests_in_flight";

/// Records HTTP metrics for the traversal below it.
///
/// Failed traversals are counted with the `error` status label.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsHandler;

impl MetricsHandler {
    /// Create a new metrics handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

struct InFlight;

impl InFlight {
    fn enter() -> Self {
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        metrics::gauge!(METRIC_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}

impl Interceptor for MetricsHandler {
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Result<Response>> {
        let method = request.method().to_string();

        Box::pin(async move {
            let start = Instant::now();
            // Released on completion and on cancellation
            let _in_flight = InFlight::enter();

            let result = next.run(request).await;

            let duration = start.elapsed().as_secs_f64();
            metrics::histogram!(METRIC_REQUEST_DURATION, LABEL_METHOD => method.clone())
                .record(duration);

            let status = match &result {
                Ok(response) => response.status().as_u16().to_string(),
                Err(_) => "error".to_string(),
            };
            metrics::counter!(
                METRIC_REQUESTS_TOTAL,
                LABEL_METHOD => method,
                LABEL_STATUS => status
            )
            .increment(1);

            result
        })
    }

    fn name(&self) -> &'static str {
        "metrics"
    }
}
