//! Reserved application errors backing the default response paths.

use crate::errors::app_error::AppError;
use crate::errors::status::SemanticStatus;

/// Returned for every opaque failure and every recovered panic.
pub const INTERNAL_SERVER_ERROR_RESPONSE: AppError = AppError::from_static(
    SemanticStatus::InternalServerError,
    "internal_server_error",
    "Internal server error",
);

/// Returned when request input fails schema validation.
pub const VALIDATION_FAILED_RESPONSE: AppError = AppError::from_static(
    SemanticStatus::ValidationFailed,
    "validation_failed",
    "Validation failed",
);

/// Returned when no route matches the request.
pub const NOT_FOUND_RESPONSE: AppError =
    AppError::from_static(SemanticStatus::NotFound, "not_found", "Resource not found");

/// Returned when a request exceeds its time budget.
pub const REQUEST_TIMEOUT_RESPONSE: AppError =
    AppError::from_static(SemanticStatus::Timeout, "request_timeout", "Request timed out");

/// Returned when the request body is not valid JSON.
pub const INVALID_BODY_RESPONSE: AppError = AppError::from_static(
    SemanticStatus::BadRequest,
    "bad_request",
    "Request body is not valid JSON",
);
