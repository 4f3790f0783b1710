//! Shared utilities for pipeline and end-to-end tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::Request,
    response::Response,
    routing::get,
    Router,
};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use o11y_api::config::HttpConfig;
use o11y_api::errors::AppError;
use o11y_api::http::middleware::abort_handler;
use o11y_api::http::{api_routes, with_pipeline, ApiError};
use o11y_api::observability::HttpMetrics;

/// Full pipeline around the real routes plus a few misbehaving handlers.
pub struct Harness {
    pub router: Router,
    pub metrics: Arc<HttpMetrics>,
    pub spans: InMemorySpanExporter,
    _provider: SdkTracerProvider,
}

pub fn harness() -> Harness {
    harness_with(HttpConfig::default())
}

pub fn harness_with(config: HttpConfig) -> Harness {
    let spans = InMemorySpanExporter::default();
    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(spans.clone())
        .build();
    let tracer = provider.tracer("pipeline-test");
    let metrics = Arc::new(HttpMetrics::new().expect("metrics registry"));

    let routes = api_routes(&config, metrics.clone()).merge(faulty_routes());
    let router = with_pipeline(routes, &config, metrics.clone(), tracer);

    Harness {
        router,
        metrics,
        spans,
        _provider: provider,
    }
}

async fn explode() -> &'static str {
    panic!("database exploded: password=hunter2")
}

async fn abort() -> &'static str {
    abort_handler()
}

fn faulty_routes() -> Router {
    Router::new()
        .route("/test/panic", get(explode))
        .route("/test/abort", get(abort))
        .route(
            "/test/opaque",
            get(|| async {
                Err::<(), _>(ApiError::opaque(io::Error::new(
                    io::ErrorKind::Other,
                    "connection refused: postgres://admin:secret@db",
                )))
            }),
        )
        .route(
            "/test/conflict",
            get(|| async {
                Err::<(), _>(ApiError::from(AppError::conflict(
                    "email_taken",
                    "Email already registered",
                )))
            }),
        )
}

impl Harness {
    pub async fn send(&self, req: Request) -> Response {
        self.router.clone().oneshot(req).await.expect("infallible")
    }

    /// Send `req` with a subscriber that records every event it emits.
    pub async fn send_logged(&self, req: Request) -> (Response, Vec<LogLine>) {
        let capture = LogCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let response = self.send(req).with_subscriber(subscriber).await;
        let lines = capture.0.lock().expect("log capture").clone();
        (response, lines)
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// `http_requests_total` for one label pair.
    pub fn request_count(&self, method: &str, route: &str) -> Option<f64> {
        sample(
            &self.metrics.render(),
            &format!(r#"http_requests_total{{method="{method}",route="{route}"}} "#),
        )
    }

    pub fn in_flight(&self) -> Option<f64> {
        sample(&self.metrics.render(), "http_inflight_requests ")
    }
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: Level,
    pub fields: HashMap<String, String>,
}

impl LogLine {
    pub fn message(&self) -> &str {
        self.fields.get("message").map(String::as_str).unwrap_or_default()
    }
}

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<LogLine>>>);

struct FieldMap<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldMap<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_owned(), value.to_owned());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_owned(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldMap(&mut fields));
        if let Ok(mut lines) = self.0.lock() {
            lines.push(LogLine {
                level: *event.metadata().level(),
                fields,
            });
        }
    }
}

pub fn sample(rendered: &str, prefix: &str) -> Option<f64> {
    rendered
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .and_then(|value| value.trim().parse().ok())
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}
