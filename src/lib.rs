//! HTTP API shell with a fixed observability pipeline.
//!
//! Every request passes panic recovery, correlation, tracing, metrics and
//! access logging before reaching a handler; every handler failure is
//! translated into one stable error envelope.

pub mod config;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use errors::{AppError, SemanticStatus};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
