//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide `tracing` subscriber once at startup
//! - Pick JSON or text output from config
//! - Resolve the level filter (`RUST_LOG` wins over `log.level`)
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, text format for development
//! - Request-scoped fields (correlation_id, trace_id, span_id) come from the
//!   `request` span opened by the context enricher, so every event inside a
//!   request carries them without explicit plumbing

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogFormat};

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Resolve the filter: `RUST_LOG` when set, otherwise the configured level.
pub fn build_filter(config: &LogConfig) -> Result<EnvFilter, LogError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directive) if !directive.trim().is_empty() => {
            EnvFilter::try_new(directive).map_err(|e| LogError::InvalidFilter(e.to_string()))
        }
        _ => EnvFilter::try_new(&config.level).map_err(|e| LogError::InvalidFilter(e.to_string())),
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &LogConfig) -> Result<(), LogError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_file(config.add_source)
                    .with_line_number(config.add_source),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_file(config.add_source)
                    .with_line_number(config.add_source),
            )
            .try_init(),
    };

    result.map_err(|_| LogError::AlreadyInitialized)
}
