//! Request pipeline stages.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → panic_guard.rs  (catch panics, abort signal)
//!     → correlation.rs  (correlation id, `request` log span)
//!     → trace.rs        (server span)
//!     → metrics.rs      (in-flight gauge, counter, histogram)
//!     → logging.rs      (access log)
//!     → cors.rs         (preflight, CORS headers)
//!     → timeout.rs      (request budget)
//!     → router → matched_path.rs → handler
//! ```
//!
//! The outbound pass unwinds in reverse, so every stage sees the final
//! response, including the envelope written for a handler error.

pub mod correlation;
pub mod cors;
pub mod logging;
pub mod matched_path;
pub mod metrics;
pub mod panic_guard;
pub mod timeout;
pub mod trace;

pub use correlation::enrich_context;
pub use cors::cors_layer;
pub use logging::log_requests;
pub use matched_path::{capture_matched_route, MatchedRoute};
pub use metrics::measure_requests;
pub use panic_guard::{abort_handler, recover_panics, AbortHandler};
pub use timeout::enforce_timeout;
pub use trace::trace_requests;
