//! Classified errors.
//!
//! Every failure that leaves the account services is a [`ClassifiedError`]:
//! a small [`ErrorKind`] taxonomy plus the HTTP status a transport layer
//! should answer with. Classification happens once, at the lowest layer that
//! understands the failure; upper layers may only add component attribution.

use serde::{Deserialize, Serialize};

/// Business error categories.
///
/// Each variant maps to a fixed status hint:
/// - `Validation` -> 400 Bad Request
/// - `Unauthorized` -> 401 Unauthorized
/// - `NotFound` -> 404 Not Found
/// - `Conflict` -> 409 Conflict
/// - `Unknown` -> 500 Internal Server Error
/// - `RemoteFailure` -> 502 Bad Gateway
/// - `Unavailable` -> 503 Service Unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Input failed validation (malformed tax id, bad parameters).
    Validation,
    /// A uniqueness constraint rejected the operation.
    Conflict,
    /// The requested record does not exist.
    NotFound,
    /// The identity provider rejected the credentials.
    Unauthorized,
    /// The identity provider answered with a structured error.
    RemoteFailure,
    /// A dependency could not be reached in time.
    Unavailable,
    /// Anything not otherwise understood.
    Unknown,
}

impl ErrorKind {
    /// Suggested HTTP status code for this kind.
    #[must_use]
    pub const fn status_hint(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Unknown => 500,
            Self::RemoteFailure => 502,
            Self::Unavailable => 503,
        }
    }

    /// Stable machine-readable name (`NOT_FOUND`, `CONFLICT`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::RemoteFailure => "REMOTE_FAILURE",
            Self::Unavailable => "UNAVAILABLE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Whether the failure is on the server side (5xx).
    #[must_use]
    pub const fn is_server_error(self) -> bool {
        self.status_hint() >= 500
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure with its business category and transport status hint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{kind}] {message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    status_hint: u16,
    message: String,
    component: Option<String>,
}

impl ClassifiedError {
    /// Create an error of the given kind; the status hint follows the kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_hint: kind.status_hint(),
            message: message.into(),
            component: None,
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Create an error for an unclassifiable failure.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Stamp the component that surfaced this error.
    ///
    /// The first attribution wins: an error already attributed by a lower
    /// layer keeps its component. Kind and status hint never change.
    #[must_use]
    pub fn attributed(mut self, component: &str) -> Self {
        if self.component.is_none() {
            self.component = Some(component.to_owned());
        }
        self
    }

    /// The business category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The HTTP status a transport layer should use verbatim.
    #[must_use]
    pub const fn status_hint(&self) -> u16 {
        self.status_hint
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Component that first attributed the error, if any.
    #[must_use]
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_hints() {
        assert_eq!(ClassifiedError::validation("x").status_hint(), 400);
        assert_eq!(ClassifiedError::unauthorized("x").status_hint(), 401);
        assert_eq!(ClassifiedError::not_found("x").status_hint(), 404);
        assert_eq!(ClassifiedError::conflict("x").status_hint(), 409);
        assert_eq!(ClassifiedError::unknown("x").status_hint(), 500);
        assert_eq!(
            ClassifiedError::new(ErrorKind::RemoteFailure, "x").status_hint(),
            502
        );
        assert_eq!(
            ClassifiedError::new(ErrorKind::Unavailable, "x").status_hint(),
            503
        );
    }

    #[test]
    fn test_first_attribution_wins() {
        let err = ClassifiedError::conflict("cpf already registered")
            .attributed("AccountStore")
            .attributed("CustomerService");
        assert_eq!(err.component(), Some("AccountStore"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_hint(), 409);
    }

    #[test]
    fn test_display() {
        let err = ClassifiedError::validation("Invalid CPF");
        assert_eq!(err.to_string(), "[VALIDATION] Invalid CPF");
    }

    #[test]
    fn test_server_error_kinds() {
        assert!(ErrorKind::Unknown.is_server_error());
        assert!(ErrorKind::Unavailable.is_server_error());
        assert!(ErrorKind::RemoteFailure.is_server_error());
        assert!(!ErrorKind::NotFound.is_server_error());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::RemoteFailure).ok();
        assert_eq!(json.as_deref(), Some("\"REMOTE_FAILURE\""));
    }
}
