//! Panic recovery.
//!
//! # Responsibilities
//! - Catch any panic raised inside the pipeline or a handler
//! - Log it with a backtrace and answer with the internal-error envelope
//! - Honour the connection-abort signal without answering
//!
//! # Design Decisions
//! - Outermost stage, so inner drop guards (span, in-flight gauge) have
//!   already run by the time a response is written
//! - Upgraded connections get a bare 500; the body belongs to the new protocol

use std::any::Any;
use std::backtrace::Backtrace;
use std::io;
use std::panic::AssertUnwindSafe;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::{stream, FutureExt};

use crate::http::response::internal_error_body;

/// Connection-abort signal.
///
/// Returning it (or panicking with it via [`abort_handler`]) tears the
/// connection down: the status line may already be on the wire, but no body
/// is ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortHandler;

/// Marker left on responses produced by [`AbortHandler`].
#[derive(Debug, Clone, Copy)]
pub struct Aborted;

impl IntoResponse for AbortHandler {
    fn into_response(self) -> Response {
        let body = Body::from_stream(stream::once(async {
            Err::<axum::body::Bytes, _>(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "handler aborted",
            ))
        }));
        let mut response = Response::new(body);
        response.extensions_mut().insert(Aborted);
        response
    }
}

/// Unwind out of the current handler with the abort signal.
pub fn abort_handler() -> ! {
    std::panic::panic_any(AbortHandler)
}

/// Convert panics into 500 responses.
pub async fn recover_panics(req: Request, next: Next) -> Response {
    let upgrade = is_upgrade(req.headers());
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) if payload.is::<AbortHandler>() => AbortHandler.into_response(),
        Err(payload) => {
            let backtrace = Backtrace::force_capture();
            tracing::error!(
                method = %method,
                path = %path,
                panic = %panic_message(payload.as_ref()),
                backtrace = %backtrace,
                "HTTP request panic"
            );

            if upgrade {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            } else {
                internal_error_body()
            }
        }
    }
}

/// `Connection: upgrade` (any case, possibly among other tokens).
pub(crate) fn is_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ErrorEnvelope;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/boom", get(boom))
            .route("/number", get(number))
            .route("/abort", get(abort))
            .layer(middleware::from_fn(recover_panics))
    }

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    async fn number() -> &'static str {
        std::panic::panic_any(42_u32)
    }

    async fn abort() -> &'static str {
        abort_handler()
    }

    fn get_req(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_passes_through_normal_responses() {
        let response = app().oneshot(get_req("/ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error_envelope() {
        for uri in ["/boom", "/number"] {
            let response = app().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let envelope: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(envelope.code, "internal_server_error");
            assert!(!String::from_utf8_lossy(&bytes).contains("kaboom"));
        }
    }

    #[tokio::test]
    async fn test_upgrade_panic_has_no_body() {
        let req = Request::builder()
            .uri("/boom")
            .header(header::CONNECTION, "keep-alive, Upgrade")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_abort_signal_produces_no_body() {
        let response = app().oneshot(get_req("/abort")).await.unwrap();
        assert!(response.extensions().get::<Aborted>().is_some());
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[test]
    fn test_is_upgrade() {
        let mut headers = HeaderMap::new();
        assert!(!is_upgrade(&headers));
        headers.insert(header::CONNECTION, "upgrade".parse().unwrap());
        assert!(is_upgrade(&headers));
        headers.insert(header::CONNECTION, "close".parse().unwrap());
        assert!(!is_upgrade(&headers));
    }
}
