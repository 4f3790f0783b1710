//! The typed application error.
//!
//! # Responsibilities
//! - Carry a semantic status, a stable machine code and a client-safe message
//! - Keep an optional cause for diagnostics (logs only)
//! - Provide copy-on-derive helpers (`with_cause`, `with_message`)

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::errors::status::SemanticStatus;

/// Shared, thread-safe error used as a cause.
pub type Cause = Arc<dyn StdError + Send + Sync + 'static>;

/// Immutable error value produced wherever domain logic fails.
///
/// `Display` renders code and message only; the cause is reachable through
/// `source()`.
#[derive(Clone)]
pub struct AppError {
    status: SemanticStatus,
    code: Cow<'static, str>,
    message: Cow<'static, str>,
    cause: Option<Cause>,
}

macro_rules! status_constructors {
    ($($(#[$doc:meta])* $name:ident => $status:ident;)+) => {
        $(
            $(#[$doc])*
            pub fn $name(
                code: impl Into<Cow<'static, str>>,
                message: impl Into<Cow<'static, str>>,
            ) -> Self {
                Self::new(SemanticStatus::$status, code, message)
            }
        )+
    };
}

impl AppError {
    /// Create an error with no cause.
    pub fn new(
        status: SemanticStatus,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            cause: None,
        }
    }

    /// `const` variant used for the reserved errors in `catalog`.
    pub const fn from_static(status: SemanticStatus, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code: Cow::Borrowed(code),
            message: Cow::Borrowed(message),
            cause: None,
        }
    }

    status_constructors! {
        /// 500; the fallback category.
        unknown => Unknown;
        /// 401
        unauthorized => Unauthorized;
        /// 403
        forbidden => Forbidden;
        /// 404
        not_found => NotFound;
        /// 422
        unprocessable_entity => UnprocessableEntity;
        /// 409
        conflict => Conflict;
        /// 429
        too_many_requests => TooManyRequests;
        /// 400
        bad_request => BadRequest;
        /// 400, or 422 when the response carries field details.
        validation_failed => ValidationFailed;
        /// 500
        internal_server_error => InternalServerError;
        /// 504
        timeout => Timeout;
        /// 501
        not_implemented => NotImplemented;
        /// 502
        bad_gateway => BadGateway;
        /// 503
        service_unavailable => ServiceUnavailable;
    }

    /// Return a copy with `cause` attached; status, code and message are kept.
    pub fn with_cause<E>(&self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            cause: Some(Arc::new(cause)),
            ..self.clone()
        }
    }

    /// Return a copy with a new client-facing message.
    pub fn with_message(&self, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            ..self.clone()
        }
    }

    pub fn status(&self) -> SemanticStatus {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Diagnostic cause. Never influences status or code.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code={}, message={}", self.code, self.message)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppError")
            .field("status", &self.status)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}

/// Causes compare by identity: two errors are equal only if they share the
/// same cause allocation (or both have none).
impl PartialEq for AppError {
    fn eq(&self, other: &Self) -> bool {
        let same_cause = match (&self.cause, &other.cause) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        };
        self.status == other.status
            && self.code == other.code
            && self.message == other.message
            && same_cause
    }
}

/// Display adapter that renders an error followed by its whole `source()` chain.
pub struct ErrorChain<'a>(pub &'a (dyn StdError + 'static));

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_constructor_sets_status_and_no_cause() {
        let err = AppError::not_found("user_not_found", "User not found");
        assert_eq!(err.status(), SemanticStatus::NotFound);
        assert_eq!(err.code(), "user_not_found");
        assert_eq!(err.message(), "User not found");
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_with_cause_does_not_mutate_original() {
        let base = AppError::conflict("email_taken", "Email already registered");
        let derived = base.with_cause(io::Error::new(io::ErrorKind::Other, "unique violation"));

        assert!(base.cause().is_none());
        assert!(derived.cause().is_some());
        assert_eq!(derived.status(), base.status());
        assert_eq!(derived.code(), base.code());
        assert_eq!(derived.message(), base.message());
    }

    #[test]
    fn test_with_message_keeps_status_code_and_cause() {
        let base = AppError::bad_gateway("upstream", "Upstream failed")
            .with_cause(io::Error::new(io::ErrorKind::TimedOut, "dial tcp"));
        let derived = base.with_message("Billing upstream failed");

        assert_eq!(derived.message(), "Billing upstream failed");
        assert_eq!(derived.status(), SemanticStatus::BadGateway);
        assert_eq!(derived.code(), "upstream");
        assert!(Arc::ptr_eq(
            derived.cause().expect("cause kept"),
            base.cause().expect("cause present")
        ));
    }

    #[test]
    fn test_with_message_is_idempotent() {
        let base = AppError::forbidden("no_access", "Forbidden")
            .with_cause(io::Error::new(io::ErrorKind::PermissionDenied, "acl"));
        let once = base.with_message("Nope");
        let twice = once.with_message("Nope");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_source_exposes_cause_chain() {
        let err = AppError::internal_server_error("db", "Internal server error")
            .with_cause(io::Error::new(io::ErrorKind::Other, "connection reset"));

        let source = err.source().expect("source");
        assert_eq!(source.to_string(), "connection reset");
        assert_eq!(
            ErrorChain(&err).to_string(),
            "code=db, message=Internal server error: connection reset"
        );
        assert_eq!(err.to_string(), "code=db, message=Internal server error");
    }

    #[test]
    fn test_every_status_has_a_constructor() {
        let built = [
            AppError::unknown("c", "m"),
            AppError::unauthorized("c", "m"),
            AppError::forbidden("c", "m"),
            AppError::not_found("c", "m"),
            AppError::unprocessable_entity("c", "m"),
            AppError::conflict("c", "m"),
            AppError::too_many_requests("c", "m"),
            AppError::bad_request("c", "m"),
            AppError::validation_failed("c", "m"),
            AppError::internal_server_error("c", "m"),
            AppError::timeout("c", "m"),
            AppError::not_implemented("c", "m"),
            AppError::bad_gateway("c", "m"),
            AppError::service_unavailable("c", "m"),
        ];
        let statuses: Vec<_> = built.iter().map(AppError::status).collect();
        assert_eq!(statuses, SemanticStatus::ALL.to_vec());
        assert_eq!(AppError::unknown("c", "m").status().http_status().as_u16(), 500);
    }

    #[test]
    fn test_display_without_cause() {
        let err = AppError::timeout("slow", "Request timed out");
        assert_eq!(err.to_string(), "code=slow, message=Request timed out");
    }
}
