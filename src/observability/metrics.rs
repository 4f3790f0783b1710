//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the HTTP request aggregates
//! - Expose Prometheus-compatible exposition text for the scrape endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, route pattern
//! - `http_request_duration_seconds` (histogram): latency by method, route pattern
//! - `http_inflight_requests` (gauge): requests currently inside the pipeline
//!
//! # Design Decisions
//! - The recorder is owned, not installed globally; the pipeline receives it
//!   explicitly so tests can build isolated registries
//! - Route labels are patterns, never raw paths, when a route matched
//! - Histogram buckets are the Prometheus client defaults

use std::time::Duration;

use metrics::{Gauge, Key, Label, Level, Metadata, Recorder, Unit};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

/// Scrape endpoint; excluded from its own measurement.
pub const METRICS_PATH: &str = "/metrics";

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const INFLIGHT_REQUESTS: &str = "http_inflight_requests";

/// Prometheus client default buckets, in seconds.
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

static METADATA: Metadata<'static> = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

/// Request aggregates backed by a private Prometheus registry.
pub struct HttpMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    inflight: Gauge,
}

impl HttpMetrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION_SECONDS.to_string()), &DEFAULT_BUCKETS)?
            .build_recorder();

        recorder.describe_counter(REQUESTS_TOTAL.into(), Some(Unit::Count), "Total number of HTTP requests".into());
        recorder.describe_histogram(
            REQUEST_DURATION_SECONDS.into(),
            Some(Unit::Seconds),
            "Histogram of HTTP request durations".into(),
        );
        recorder.describe_gauge(
            INFLIGHT_REQUESTS.into(),
            None,
            "Current number of inflight HTTP requests".into(),
        );

        let handle = recorder.handle();
        let inflight = recorder.register_gauge(&Key::from_name(INFLIGHT_REQUESTS), &METADATA);
        inflight.set(0.0);

        Ok(Self { recorder, handle, inflight })
    }

    /// Count one finished request and observe its latency.
    pub fn record_request(&self, method: &str, route: &str, elapsed: Duration) {
        let labels = vec![
            Label::new("method", method.to_owned()),
            Label::new("route", route.to_owned()),
        ];

        let counter_key = Key::from_parts(REQUESTS_TOTAL, labels.clone());
        self.recorder.register_counter(&counter_key, &METADATA).increment(1);

        let histogram_key = Key::from_parts(REQUEST_DURATION_SECONDS, labels);
        self.recorder
            .register_histogram(&histogram_key, &METADATA)
            .record(elapsed.as_secs_f64());
    }

    /// Increment the in-flight gauge until the returned guard drops.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.inflight.increment(1.0);
        InFlightGuard {
            gauge: self.inflight.clone(),
        }
    }

    /// Prometheus text exposition.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl std::fmt::Debug for HttpMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMetrics").finish_non_exhaustive()
    }
}

/// Decrements the in-flight gauge on drop, including during unwinding.
#[must_use = "the gauge is decremented when the guard drops"]
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}
