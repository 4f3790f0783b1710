//! Per-request time budget.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::catalog::REQUEST_TIMEOUT_RESPONSE;
use crate::http::response::ApiError;

/// Drop the inner future once `budget` elapses and answer with the timeout envelope.
pub async fn enforce_timeout(State(budget): State<Duration>, req: Request, next: Next) -> Response {
    match tokio::time::timeout(budget, next.run(req)).await {
        Ok(response) => response,
        Err(_) => ApiError::from(REQUEST_TIMEOUT_RESPONSE).into_response(),
    }
}
