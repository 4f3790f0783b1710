//! Request context enricher.
//!
//! Attaches a [`CorrelationId`] to every request and opens the `request`
//! tracing span that downstream stages and handlers log under.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{field, Instrument};

use crate::http::request::{CorrelationId, X_CORRELATION_ID};

/// Longest inbound correlation id that is propagated as-is.
const MAX_CORRELATION_ID_LEN: usize = 128;

/// Reuse the inbound id or generate one, and echo it on the response.
pub async fn enrich_context(mut req: Request, next: Next) -> Response {
    let id = inbound_id(req.headers()).unwrap_or_else(CorrelationId::generate);

    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!(
        "request",
        correlation_id = %id,
        trace_id = field::Empty,
        span_id = field::Empty,
    );

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(X_CORRELATION_ID, value);
    }

    response
}

/// Malformed, empty or oversized values count as absent.
fn inbound_id(headers: &HeaderMap) -> Option<CorrelationId> {
    let value = headers.get(X_CORRELATION_ID)?.to_str().ok()?;
    if value.trim().is_empty() || value.len() > MAX_CORRELATION_ID_LEN {
        return None;
    }
    Some(CorrelationId(value.to_owned()))
}
