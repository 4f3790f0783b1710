//! Error taxonomy subsystem.
//!
//! # Data Flow
//! ```text
//! Domain / handler code
//!     → app_error.rs (AppError: status + code + message + cause)
//!     → status.rs (SemanticStatus → HTTP status code)
//!     → http::response (envelope rendered for the client)
//! ```
//!
//! # Design Decisions
//! - The set of semantic statuses is closed; transport codes are derived, never stored
//! - `AppError` is immutable; derivations return new values
//! - The cause chain is for diagnostics only and never reaches the client

pub mod app_error;
pub mod catalog;
pub mod status;

pub use app_error::AppError;
pub use catalog::{INTERNAL_SERVER_ERROR_RESPONSE, NOT_FOUND_RESPONSE, VALIDATION_FAILED_RESPONSE};
pub use status::SemanticStatus;
