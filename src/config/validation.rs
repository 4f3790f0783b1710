//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, ratios in range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("http.port is required")]
    MissingPort,

    #[error("http.{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("otel.trace_id_ratio must be between 0 and 1, got {0}")]
    TraceRatioOutOfRange(f64),

    #[error("otel.service_name is required when a collector is configured")]
    MissingServiceName,

    #[error("log.level is not a valid filter directive: {0}")]
    InvalidLogLevel(String),

    #[error("http.cors.allow_credentials cannot be combined with a wildcard {0}")]
    CredentialsWithWildcard(&'static str),
}

/// Check every semantic rule and collect all violations.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.port == 0 {
        errors.push(ValidationError::MissingPort);
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_timeout_secs"));
    }
    if config.http.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("shutdown_timeout_secs"));
    }

    let ratio = config.otel.trace_id_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        errors.push(ValidationError::TraceRatioOutOfRange(ratio));
    }
    if config.otel.export_enabled() && config.otel.service_name.trim().is_empty() {
        errors.push(ValidationError::MissingServiceName);
    }

    let cors = &config.http.cors;
    if cors.allow_credentials {
        if cors.allowed_origins.is_empty() || cors.allowed_origins.iter().any(|o| o == "*") {
            errors.push(ValidationError::CredentialsWithWildcard("origin"));
        }
        if cors.allowed_methods.iter().any(|m| m == "*") {
            errors.push(ValidationError::CredentialsWithWildcard("method"));
        }
        if cors.allowed_headers.iter().any(|h| h == "*") {
            errors.push(ValidationError::CredentialsWithWildcard("header"));
        }
    }

    if EnvFilter::try_new(&config.log.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
