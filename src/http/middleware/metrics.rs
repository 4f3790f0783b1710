//! Metrics stage: in-flight gauge, request counter and latency histogram.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::middleware::matched_path::matched_route;
use crate::observability::metrics::{HttpMetrics, InFlightGuard, METRICS_PATH};

pub async fn measure_requests(State(metrics): State<Arc<HttpMetrics>>, req: Request, next: Next) -> Response {
    if req.uri().path() == METRICS_PATH {
        return next.run(req).await;
    }

    let mut sample = RequestSample {
        method: req.method().as_str().to_owned(),
        path: req.uri().path().to_owned(),
        route: None,
        start: Instant::now(),
        _in_flight: metrics.track_in_flight(),
        metrics,
    };

    let response = next.run(req).await;
    sample.route = matched_route(&response).map(str::to_owned);
    drop(sample);

    response
}

/// Records the counter and histogram on drop, so a request that unwinds
/// out of the handler is still measured.
struct RequestSample {
    method: String,
    path: String,
    route: Option<String>,
    start: Instant,
    _in_flight: InFlightGuard,
    metrics: Arc<HttpMetrics>,
}

impl Drop for RequestSample {
    fn drop(&mut self) {
        // Raw path only when no pattern matched, so the label is never empty.
        let route = self.route.as_deref().unwrap_or(&self.path);
        self.metrics.record_request(&self.method, route, self.start.elapsed());
    }
}
