//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! main
//!     → logging.rs (global tracing subscriber, built once)
//!     → metrics.rs (HttpMetrics registry, injected into the pipeline)
//!     → tracing.rs (tracer provider, injected into the pipeline)
//!
//! Consumers:
//!     → stdout (JSON or text log lines)
//!     → GET /metrics (Prometheus scrape)
//!     → OTLP collector (optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Correlation id and trace ids flow through every log line of a request
//! - Metrics are cheap (atomic increments)
//! - Trace export is optional; span creation is not

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::metrics::HttpMetrics;
pub use self::tracing::{init_tracer, TelemetryError, TelemetryGuard};
