//! Error responses.
//!
//! # Responsibilities
//! - Define the client-facing error envelope (`code`, `message`, `error_details`)
//! - Translate handler failures into exactly one status + envelope
//! - Keep internals (opaque messages, causes, panics) out of the payload
//!
//! # Design Decisions
//! - `Failure` is an explicit discriminant; no runtime type inspection
//! - The responder is the single place where error semantics become HTTP
//! - Server-side failures (>= 500) are logged here with the full cause chain

use std::error::Error as StdError;
use std::fmt;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::app_error::ErrorChain;
use crate::errors::{AppError, INTERNAL_SERVER_ERROR_RESPONSE, VALIDATION_FAILED_RESPONSE};
use crate::http::request::FieldError;

/// Single field-level validation problem as sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub field: String,
    pub message: String,
}

/// Wire envelope for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<Vec<ErrorDetail>>,
}

/// Envelope paired with the status code it is sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: StatusCode,
    pub envelope: ErrorEnvelope,
}

impl ErrorResponse {
    /// Compose a response from taxonomy fields.
    pub fn build(
        status: StatusCode,
        code: &str,
        message: &str,
        details: Option<Vec<ErrorDetail>>,
    ) -> Self {
        Self {
            status,
            envelope: ErrorEnvelope {
                code: code.to_owned(),
                message: message.to_owned(),
                error_details: details,
            },
        }
    }

    /// Response for a typed error, without field details.
    pub fn from_app_error(err: &AppError) -> Self {
        Self::build(err.status().http_status(), err.code(), err.message(), None)
    }

    /// The generic 500 response.
    pub fn internal() -> Self {
        Self::from_app_error(&INTERNAL_SERVER_ERROR_RESPONSE)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// One failure surfaced by a handler or by input extraction.
pub enum Failure {
    /// A typed application error.
    Typed(AppError),
    /// A structural field error from input validation.
    Field(FieldError),
    /// Anything else. Its text is never sent to the client.
    Opaque(Box<dyn StdError + Send + Sync + 'static>),
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Typed(err) => f.debug_tuple("Typed").field(err).finish(),
            Failure::Field(err) => f.debug_tuple("Field").field(err).finish(),
            Failure::Opaque(err) => f.debug_tuple("Opaque").field(&err.to_string()).finish(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Typed(err) => write!(f, "{}", ErrorChain(err)),
            Failure::Field(err) => write!(f, "{err}"),
            Failure::Opaque(err) => write!(f, "{}", ErrorChain(err.as_ref())),
        }
    }
}

/// Convert the failures of one request into a response.
///
/// - no failures: 500, logged as an anomaly
/// - more than one failure, or a lone field failure: 422 validation envelope
///   built from the field failures in order (others are dropped)
/// - one typed failure: its translated status and envelope
/// - one opaque failure: the generic 500 envelope
pub fn respond(failures: &[Failure]) -> ErrorResponse {
    let response = match failures {
        [] => {
            tracing::error!("Error response requested with no error attached");
            return ErrorResponse::internal();
        }
        [Failure::Typed(err)] => ErrorResponse::from_app_error(err),
        [Failure::Opaque(_)] => ErrorResponse::internal(),
        _ => validation_response(failures),
    };

    if response.status.is_server_error() {
        for failure in failures {
            tracing::error!(
                status = response.status.as_u16(),
                error = %failure,
                "Handler error"
            );
        }
    }

    response
}

fn validation_response(failures: &[Failure]) -> ErrorResponse {
    let details = failures
        .iter()
        .filter_map(|failure| match failure {
            Failure::Field(field) => Some(ErrorDetail {
                field: field.location.clone(),
                message: field.message.clone(),
            }),
            _ => None,
        })
        .collect();

    ErrorResponse::build(
        StatusCode::UNPROCESSABLE_ENTITY,
        VALIDATION_FAILED_RESPONSE.code(),
        VALIDATION_FAILED_RESPONSE.message(),
        Some(details),
    )
}

/// Error half of every handler result.
#[derive(Debug)]
pub struct ApiError {
    failures: Vec<Failure>,
}

impl ApiError {
    /// Wrap an unexpected error; only the generic 500 envelope is returned.
    pub fn opaque<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            failures: vec![Failure::Opaque(err.into())],
        }
    }

    /// Input validation failure with one entry per violated rule.
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            failures: errors.into_iter().map(Failure::Field).collect(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self {
            failures: vec![Failure::Typed(err)],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        respond(&self.failures).into_response()
    }
}

/// Write the generic 500 envelope without going through serde's fallible path.
pub(crate) fn internal_error_body() -> Response {
    let body = serde_json::to_vec(&ErrorResponse::internal().envelope).unwrap_or_else(|_| {
        br#"{"code":"internal_server_error","message":"Internal server error"}"#.to_vec()
    });
    let mut response = Response::new(axum::body::Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
