//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Log output settings.
    pub log: LogConfig,

    /// HTTP listener and pipeline settings.
    pub http: HttpConfig,

    /// OpenTelemetry trace export settings.
    pub otel: OtelConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// JSON for production, text for development.
    pub format: LogFormat,

    /// Filter directive (e.g. "info" or "o11y_api=debug,info").
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Include file and line of the call site.
    pub add_source: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            add_source: false,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Port to listen on (all interfaces).
    pub port: u16,

    /// Mount `/docs` and `/docs/openapi.yml`.
    pub swagger_enabled: bool,

    /// Per-request time budget.
    pub request_timeout_secs: u64,

    /// Drain budget for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,

    /// CORS policy.
    pub cors: CorsConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            swagger_enabled: true,
            request_timeout_secs: 10,
            shutdown_timeout_secs: 5,
            cors: CorsConfig::default(),
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// CORS configuration. An empty origin list, or one containing "*", allows any origin.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_headers: ["Accept", "Authorization", "Content-Type"]
                .into_iter()
                .map(String::from)
                .collect(),
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: 86_400,
        }
    }
}

/// OpenTelemetry configuration. An empty `collector_url` disables export.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OtelConfig {
    pub service_name: String,

    /// OTLP gRPC endpoint (host:port or URL).
    pub collector_url: String,

    /// Plain-text gRPC instead of TLS.
    pub insecure: bool,

    /// Fraction of root traces sampled, 0.0..=1.0.
    pub trace_id_ratio: f64,

    /// Sent as the `authorization` metadata value when non-empty.
    pub collector_auth: String,

    pub k8s_pod_name: String,
    pub k8s_namespace: String,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            service_name: "o11y-api".to_string(),
            collector_url: String::new(),
            insecure: false,
            trace_id_ratio: 1.0,
            collector_auth: String::new(),
            k8s_pod_name: String::new(),
            k8s_namespace: String::new(),
        }
    }
}

impl OtelConfig {
    pub fn export_enabled(&self) -> bool {
        !self.collector_url.is_empty()
    }
}
