//! Matched-route capture.
//!
//! Outer stages run before routing and never see axum's [`MatchedPath`].
//! This route-level layer copies it onto the response so they can label by
//! pattern on the way out.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

/// Route template that served the request, e.g. `/api/v1/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

impl MatchedRoute {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Copy the matched pattern into the response extensions.
pub async fn capture_matched_route(req: Request, next: Next) -> Response {
    let matched = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| MatchedRoute(path.as_str().to_owned()));

    let mut response = next.run(req).await;
    if let Some(route) = matched {
        response.extensions_mut().insert(route);
    }
    response
}

/// Pattern recorded on `response`, if a route matched.
pub fn matched_route(response: &Response) -> Option<&str> {
    response.extensions().get::<MatchedRoute>().map(MatchedRoute::as_str)
}
