//! Semantic error statuses and their HTTP translation.

use std::fmt;

use axum::http::StatusCode;

/// Transport-independent failure category.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticStatus {
    Unknown = 0,
    Unauthorized = 1,
    Forbidden = 2,
    NotFound = 3,
    UnprocessableEntity = 4,
    Conflict = 5,
    TooManyRequests = 6,
    BadRequest = 7,
    ValidationFailed = 8,
    InternalServerError = 9,
    Timeout = 10,
    NotImplemented = 11,
    BadGateway = 12,
    ServiceUnavailable = 13,
}

impl SemanticStatus {
    /// Every status, in declaration order.
    pub const ALL: [SemanticStatus; 14] = [
        SemanticStatus::Unknown,
        SemanticStatus::Unauthorized,
        SemanticStatus::Forbidden,
        SemanticStatus::NotFound,
        SemanticStatus::UnprocessableEntity,
        SemanticStatus::Conflict,
        SemanticStatus::TooManyRequests,
        SemanticStatus::BadRequest,
        SemanticStatus::ValidationFailed,
        SemanticStatus::InternalServerError,
        SemanticStatus::Timeout,
        SemanticStatus::NotImplemented,
        SemanticStatus::BadGateway,
        SemanticStatus::ServiceUnavailable,
    ];

    /// Human-readable label.
    pub const fn as_str(self) -> &'static str {
        match self {
            SemanticStatus::Unknown => "Unknown",
            SemanticStatus::Unauthorized => "Unauthorized",
            SemanticStatus::Forbidden => "Forbidden",
            SemanticStatus::NotFound => "Not found",
            SemanticStatus::UnprocessableEntity => "Unprocessable entity",
            SemanticStatus::Conflict => "Conflict",
            SemanticStatus::TooManyRequests => "Too many requests",
            SemanticStatus::BadRequest => "Bad request",
            SemanticStatus::ValidationFailed => "Validation failed",
            SemanticStatus::InternalServerError => "Internal server error",
            SemanticStatus::Timeout => "Timeout",
            SemanticStatus::NotImplemented => "Not implemented",
            SemanticStatus::BadGateway => "Bad gateway",
            SemanticStatus::ServiceUnavailable => "Service unavailable",
        }
    }

    /// Translate to the HTTP status code returned to clients.
    ///
    /// `ValidationFailed` maps to 400 here; the responder upgrades it to 422
    /// when field-level details are attached.
    pub const fn http_status(self) -> StatusCode {
        match self {
            SemanticStatus::Unauthorized => StatusCode::UNAUTHORIZED,
            SemanticStatus::Forbidden => StatusCode::FORBIDDEN,
            SemanticStatus::NotFound => StatusCode::NOT_FOUND,
            SemanticStatus::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            SemanticStatus::Conflict => StatusCode::CONFLICT,
            SemanticStatus::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            SemanticStatus::BadRequest | SemanticStatus::ValidationFailed => StatusCode::BAD_REQUEST,
            SemanticStatus::Unknown | SemanticStatus::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            SemanticStatus::Timeout => StatusCode::GATEWAY_TIMEOUT,
            SemanticStatus::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            SemanticStatus::BadGateway => StatusCode::BAD_GATEWAY,
            SemanticStatus::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Raw discriminants outside the known range (e.g. written by a newer peer)
/// collapse to `Unknown`, which translates to 500.
impl From<u8> for SemanticStatus {
    fn from(val: u8) -> Self {
        SemanticStatus::ALL
            .get(usize::from(val))
            .copied()
            .unwrap_or(SemanticStatus::Unknown)
    }
}

impl fmt::Display for SemanticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
