//! CORS policy from configuration.

use std::time::Duration;

use axum::http::{HeaderName, Method};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Build a Tower CORS layer. Unparseable entries are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new();

    layer = if config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(AllowOrigin::any())
    } else {
        layer.allow_origin(parse_all::<axum::http::HeaderValue>(&config.allowed_origins, "origin"))
    };

    layer = if config.allowed_methods.iter().any(|m| m == "*") {
        layer.allow_methods(AllowMethods::any())
    } else {
        layer.allow_methods(parse_all::<Method>(&config.allowed_methods, "method"))
    };

    layer = if config.allowed_headers.iter().any(|h| h == "*") {
        layer.allow_headers(AllowHeaders::any())
    } else {
        layer.allow_headers(parse_all::<HeaderName>(&config.allowed_headers, "header"))
    };

    if !config.exposed_headers.is_empty() {
        layer = layer.expose_headers(parse_all::<HeaderName>(&config.exposed_headers, "header"));
    }

    if config.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    if config.max_age_secs > 0 {
        layer = layer.max_age(Duration::from_secs(config.max_age_secs));
    }

    layer
}

fn parse_all<T: std::str::FromStr>(values: &[String], kind: &'static str) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(kind, value = %value, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}
