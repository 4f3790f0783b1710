//! Request-side types.
//!
//! # Responsibilities
//! - Carry the per-request correlation identifier
//! - Validate JSON bodies against declared rules before deserialisation
//! - Report every violated rule as a field error
//!
//! # Design Decisions
//! - Validation runs on the raw JSON document so missing fields are reported
//!   as field errors instead of a serde message
//! - Field locations use `body.<field>` paths

use std::fmt;

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::catalog::INVALID_BODY_RESPONSE;
use crate::errors::INTERNAL_SERVER_ERROR_RESPONSE;
use crate::http::response::ApiError;

/// Canonical correlation header name.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Correlation identifier attached to every request by the context enricher.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CorrelationId>()
            .cloned()
            .ok_or_else(|| ApiError::from(INTERNAL_SERVER_ERROR_RESPONSE))
    }
}

/// A violated input rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the offending value, e.g. `body.email`.
    pub location: String,
    pub message: String,
}

impl FieldError {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Input types that declare rules for their raw JSON form.
pub trait Validate {
    /// Return every rule violated by `body`. Empty means valid.
    fn validate(body: &Value) -> Vec<FieldError>;
}

/// JSON body extractor that validates before deserialising.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "Rejected request body");
            ApiError::from(INVALID_BODY_RESPONSE.with_message(rejection.body_text()))
        })?;

        let errors = T::validate(&body);
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        serde_json::from_value(body)
            .map(ValidatedJson)
            .map_err(|e| ApiError::from(INVALID_BODY_RESPONSE.with_message(e.to_string())))
    }
}

/// Rule checker over a JSON object body.
pub struct Rules<'a> {
    object: Option<&'a Map<String, Value>>,
    errors: Vec<FieldError>,
}

impl<'a> Rules<'a> {
    /// Start checking `body`; a non-object body is itself an error.
    pub fn new(body: &'a Value) -> Self {
        let object = body.as_object();
        let errors = if object.is_none() {
            vec![FieldError::new("body", "expected object")]
        } else {
            Vec::new()
        };
        Self { object, errors }
    }

    /// Required string with a minimum length in characters.
    pub fn string(mut self, field: &str, min_length: usize) -> Self {
        if let Some(value) = self.required_str(field) {
            if value.chars().count() < min_length {
                self.errors.push(FieldError::new(
                    format!("body.{field}"),
                    format!("expected length >= {min_length}"),
                ));
            }
        }
        self
    }

    /// Required string in e-mail format.
    pub fn email(mut self, field: &str) -> Self {
        if let Some(value) = self.required_str(field) {
            if !looks_like_email(value) {
                self.errors.push(FieldError::new(
                    format!("body.{field}"),
                    "expected string to be RFC 5322 email",
                ));
            }
        }
        self
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }

    fn required_str(&mut self, field: &str) -> Option<&'a str> {
        let object = self.object?;
        match object.get(field) {
            None | Some(Value::Null) => {
                self.errors.push(FieldError::new(
                    format!("body.{field}"),
                    format!("expected required property {field} to be present"),
                ));
                None
            }
            Some(Value::String(s)) => Some(s.as_str()),
            Some(_) => {
                self.errors
                    .push(FieldError::new(format!("body.{field}"), "expected string"));
                None
            }
        }
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}
