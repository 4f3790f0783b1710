//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, pipeline order, graceful drain)
//!     → middleware/ (panic guard → enricher → trace → metrics → log → CORS → timeout)
//!     → request.rs (correlation id, validated JSON input)
//!     → users.rs / docs.rs (handlers)
//!     → response.rs (error responder, envelope)
//!     → Send to client
//! ```

pub mod docs;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod users;

pub use request::{CorrelationId, FieldError, Validate, ValidatedJson, X_CORRELATION_ID};
pub use response::{respond, ApiError, ErrorDetail, ErrorEnvelope, ErrorResponse, Failure};
pub use server::{api_routes, build_router, with_pipeline, HttpServer, ServerError};
