//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up the request pipeline in its fixed order
//! - Serve on a listener until shutdown, then drain within a time budget

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::header,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use opentelemetry_sdk::trace::SdkTracer;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot};
use tower::ServiceBuilder;

use crate::config::HttpConfig;
use crate::errors::NOT_FOUND_RESPONSE;
use crate::http::middleware::{
    capture_matched_route, cors_layer, enforce_timeout, enrich_context, log_requests, measure_requests,
    recover_panics, trace_requests,
};
use crate::http::response::ApiError;
use crate::http::{docs, users};
use crate::observability::metrics::{HttpMetrics, METRICS_PATH};

/// Prometheus text exposition format.
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assemble routes and the request pipeline.
pub fn build_router(config: &HttpConfig, metrics: Arc<HttpMetrics>, tracer: SdkTracer) -> Router {
    with_pipeline(api_routes(config, metrics.clone()), config, metrics, tracer)
}

/// Application routes plus the not-found fallback.
pub fn api_routes(config: &HttpConfig, metrics: Arc<HttpMetrics>) -> Router {
    let mut routes = Router::new()
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users/{id}", get(users::get_user_by_id))
        .route(METRICS_PATH, get(scrape_metrics));

    if config.swagger_enabled {
        routes = routes.merge(docs::routes());
    }

    routes.fallback(not_found).with_state(metrics)
}

/// Wrap `routes` in the request pipeline.
///
/// Outermost first: panic guard, context enricher, tracing, metrics,
/// access log, CORS, timeout. Route-level: matched-route capture.
pub fn with_pipeline(routes: Router, config: &HttpConfig, metrics: Arc<HttpMetrics>, tracer: SdkTracer) -> Router {
    routes.route_layer(from_fn(capture_matched_route)).layer(
        ServiceBuilder::new()
            .layer(from_fn(recover_panics))
            .layer(from_fn(enrich_context))
            .layer(from_fn_with_state(tracer, trace_requests))
            .layer(from_fn_with_state(metrics, measure_requests))
            .layer(from_fn(log_requests))
            .layer(cors_layer(&config.cors))
            .layer(from_fn_with_state(config.request_timeout(), enforce_timeout)),
    )
}

async fn scrape_metrics(State(metrics): State<Arc<HttpMetrics>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], metrics.render())
}

async fn not_found() -> ApiError {
    ApiError::from(NOT_FOUND_RESPONSE)
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    shutdown_timeout: Duration,
}

impl HttpServer {
    pub fn new(config: &HttpConfig, metrics: Arc<HttpMetrics>, tracer: SdkTracer) -> Self {
        Self {
            router: build_router(config, metrics, tracer),
            shutdown_timeout: config.shutdown_timeout(),
        }
    }

    /// Serve until `shutdown` fires, then give in-flight requests the drain
    /// budget before dropping whatever is still open.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let (draining_tx, draining_rx) = oneshot::channel::<()>();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        let mut server = Box::pin(
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!("Shutdown signal received, draining connections");
                    let _ = draining_tx.send(());
                })
                .into_future(),
        );

        tokio::select! {
            result = &mut server => result?,
            Ok(()) = draining_rx => {
                match tokio::time::timeout(self.shutdown_timeout, &mut server).await {
                    Ok(result) => result?,
                    Err(_) => tracing::warn!(
                        timeout = ?self.shutdown_timeout,
                        "Drain timeout elapsed, closing remaining connections"
                    ),
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
