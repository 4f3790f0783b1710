//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the tracer provider (OTLP export when a collector is configured)
//! - Extract W3C trace context from incoming request headers
//! - Flush and shut the provider down within a bounded time
//!
//! # Design Decisions
//! - No global provider; the tracer is handed to the pipeline explicitly
//! - Without a collector, spans are still created (so trace ids reach the
//!   logs) but never exported
//! - Parent-based ratio sampling: upstream decisions are honoured

use std::time::Duration;

use axum::http::HeaderMap;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::tonic_types::metadata::MetadataMap;
use opentelemetry_otlp::tonic_types::transport::ClientTlsConfig;
use opentelemetry_otlp::{SpanExporter, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use thiserror::Error;

use crate::config::OtelConfig;

/// Instrumentation scope name of the server tracer.
pub const TRACER_NAME: &str = "o11y-api/http";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("Invalid collector auth header value")]
    InvalidAuth,

    #[error("Tracer provider shutdown failed: {0}")]
    Shutdown(String),

    #[error("Tracer provider shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}

/// Owns the tracer provider for the lifetime of the process.
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
    tracer: SdkTracer,
}

impl TelemetryGuard {
    /// Wrap an existing provider (tests install in-memory exporters this way).
    pub fn from_provider(provider: SdkTracerProvider) -> Self {
        let tracer = provider.tracer(TRACER_NAME);
        Self { provider, tracer }
    }

    pub fn tracer(&self) -> SdkTracer {
        self.tracer.clone()
    }

    /// Flush pending spans and stop the exporter, giving up after `timeout`.
    pub async fn shutdown(self, timeout: Duration) -> Result<(), TelemetryError> {
        let provider = self.provider;
        let task = tokio::task::spawn_blocking(move || provider.shutdown());

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(TelemetryError::Shutdown(e.to_string())),
            Ok(Err(join)) => Err(TelemetryError::Shutdown(join.to_string())),
            Err(_) => Err(TelemetryError::ShutdownTimeout(timeout)),
        }
    }
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard").finish_non_exhaustive()
    }
}

/// Build the tracer provider from configuration.
pub fn init_tracer(config: &OtelConfig) -> Result<TelemetryGuard, TelemetryError> {
    let mut builder = SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            config.trace_id_ratio,
        ))))
        .with_resource(build_resource(config));

    if config.export_enabled() {
        builder = builder.with_batch_exporter(build_exporter(config)?);
        tracing::info!(
            collector = %config.collector_url,
            insecure = config.insecure,
            ratio = config.trace_id_ratio,
            "Trace export enabled"
        );
    } else {
        tracing::info!("No trace collector configured, spans are not exported");
    }

    Ok(TelemetryGuard::from_provider(builder.build()))
}

fn build_resource(config: &OtelConfig) -> Resource {
    let mut attrs = vec![
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("library.language", "rust"),
    ];
    if !config.k8s_pod_name.is_empty() {
        attrs.push(KeyValue::new("k8s.pod.name", config.k8s_pod_name.clone()));
    }
    if !config.k8s_namespace.is_empty() {
        attrs.push(KeyValue::new("k8s.namespace.name", config.k8s_namespace.clone()));
    }

    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes(attrs)
        .build()
}

fn build_exporter(config: &OtelConfig) -> Result<SpanExporter, TelemetryError> {
    let endpoint = collector_endpoint(&config.collector_url, config.insecure);

    let mut metadata = MetadataMap::new();
    if !config.collector_auth.is_empty() {
        let value = config
            .collector_auth
            .parse()
            .map_err(|_| TelemetryError::InvalidAuth)?;
        metadata.insert("authorization", value);
    }

    let mut exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_metadata(metadata);

    if !config.insecure {
        exporter = exporter.with_tls_config(ClientTlsConfig::new().with_native_roots());
    }

    Ok(exporter.build()?)
}

/// Prefix a scheme when the collector is given as bare `host:port`.
fn collector_endpoint(url: &str, insecure: bool) -> String {
    if url.contains("://") {
        url.to_string()
    } else if insecure {
        format!("http://{url}")
    } else {
        format!("https://{url}")
    }
}

/// Read-only view of request headers for context propagation.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

/// Upstream trace context from `traceparent` / `tracestate`, if any.
pub fn extract_context(headers: &HeaderMap) -> Context {
    TraceContextPropagator::new().extract(&HeaderExtractor(headers))
}
