//! Tracing stage.
//!
//! # Responsibilities
//! - Continue the upstream trace (W3C headers) or start a new one
//! - Open exactly one server span per request and close it on every path
//! - Name the span after the route pattern and record the final status
//!
//! # Design Decisions
//! - Infrastructure paths (scrape, docs) are never traced
//! - The span is owned by a drop guard; a request that never completes
//!   (panic, cancellation) still ends its span, marked as errored
//! - Trace and span ids are recorded on the enclosing `request` log span

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::{Span, SpanKind, Status, Tracer};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{SdkTracer, Span as SdkSpan};
use opentelemetry_semantic_conventions::trace as semconv;

use crate::http::middleware::logging::header_value;
use crate::http::middleware::matched_path::matched_route;
use crate::observability::metrics::METRICS_PATH;
use crate::observability::tracing::extract_context;

/// Paths that never get a span.
pub const UNTRACED_PATHS: [&str; 3] = [METRICS_PATH, "/docs", "/docs/openapi.yml"];

/// Name of the span until the route is known.
const INITIAL_SPAN_NAME: &str = "http.server";

/// Placeholder route when nothing matched.
const UNKNOWN_ROUTE: &str = "unknown";

pub async fn trace_requests(State(tracer): State<SdkTracer>, req: Request, next: Next) -> Response {
    if UNTRACED_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }

    let parent = extract_context(req.headers());
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    let host = header_value(req.headers(), header::HOST);
    let user_agent = header_value(req.headers(), header::USER_AGENT);

    let span = tracer
        .span_builder(INITIAL_SPAN_NAME)
        .with_kind(SpanKind::Server)
        .with_attributes([
            KeyValue::new(semconv::HTTP_REQUEST_METHOD, method.clone()),
            KeyValue::new(semconv::URL_PATH, path),
            KeyValue::new(semconv::SERVER_ADDRESS, host),
            KeyValue::new(semconv::USER_AGENT_ORIGINAL, user_agent),
        ])
        .start_with_context(&tracer, &parent);

    let (trace_id, span_id) = (span.span_context().trace_id(), span.span_context().span_id());
    let current = tracing::Span::current();
    current.record("trace_id", tracing::field::display(trace_id));
    current.record("span_id", tracing::field::display(span_id));

    let guard = SpanGuard { span: Some(span) };
    let response = next.run(req).await;

    let route = matched_route(&response).unwrap_or(UNKNOWN_ROUTE).to_owned();
    guard.finish(&method, &route, response.status().as_u16());

    response
}

/// Ends the span exactly once.
struct SpanGuard {
    span: Option<SdkSpan>,
}

impl SpanGuard {
    fn finish(mut self, method: &str, route: &str, status: u16) {
        let Some(mut span) = self.span.take() else {
            return;
        };
        span.update_name(format!("{method} {route}"));
        span.set_attribute(KeyValue::new(semconv::HTTP_ROUTE, route.to_owned()));
        span.set_attribute(KeyValue::new(semconv::HTTP_RESPONSE_STATUS_CODE, i64::from(status)));
        if status >= 500 {
            span.set_status(Status::error(format!("HTTP {status}")));
        }
        span.end();
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let Some(mut span) = self.span.take() {
            span.set_status(Status::error("request did not complete"));
            span.end();
        }
    }
}
