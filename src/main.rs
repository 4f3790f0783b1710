//! o11y-api
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ panic guard ──▶ enricher ──▶ trace ──▶ metrics ──▶ access log
//!                                                                     │
//!                                                                     ▼
//!     Client ◀── error responder ◀── handler ◀── router ◀── timeout ◀── CORS
//!
//!     config (defaults → file → API_* env)    lifecycle (signals → drain → flush)
//!     observability (logs → stdout, metrics → /metrics, spans → OTLP)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use o11y_api::config::load_config;
use o11y_api::http::HttpServer;
use o11y_api::lifecycle::{trigger_on_signal, Shutdown};
use o11y_api::observability::{init_tracer, logging, HttpMetrics};

/// Budget for flushing pending spans on exit.
const TELEMETRY_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "o11y-api", version, about = "HTTP API with a built-in observability pipeline")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init(&config.log)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "o11y-api starting");
    tracing::info!(
        port = config.http.port,
        swagger_enabled = config.http.swagger_enabled,
        request_timeout_secs = config.http.request_timeout_secs,
        collector = %config.otel.collector_url,
        "Configuration loaded"
    );

    let telemetry = init_tracer(&config.otel)?;
    let metrics = Arc::new(HttpMetrics::new()?);

    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.http.port))).await?;
    let server = HttpServer::new(&config.http, metrics, telemetry.tracer());

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let signals = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { trigger_on_signal(&shutdown).await })
    };

    let served = server.run(listener, shutdown_rx).await;
    signals.abort();

    if let Err(e) = telemetry.shutdown(TELEMETRY_SHUTDOWN_TIMEOUT).await {
        tracing::error!(error = %e, "Telemetry shutdown failed");
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
