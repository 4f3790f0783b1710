//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → drain (bounded) → telemetry flush → exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, flush spans
//! - Every phase has a timeout: nothing blocks exit indefinitely

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{trigger_on_signal, wait_for_signal};
