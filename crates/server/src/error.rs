//! HTTP error responses with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. The status code is taken verbatim
//! from the classified error's status hint. Failures were already logged when
//! they were classified (see [`crate::classify::attribute`]); the Sentry
//! tracing layer turns that one `error!` into the Sentry event, so nothing is
//! logged or captured again here.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use customer_identity_core::{ClassifiedError, ErrorKind};

/// Application-level error type for the identity service.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct AppError(#[from] ClassifiedError);

impl AppError {
    #[must_use]
    pub const fn classified(&self) -> &ClassifiedError {
        &self.0
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status =
            StatusCode::from_u16(self.0.status_hint()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Don't expose internal error details to clients
        let message = match kind {
            ErrorKind::Unknown => "Internal server error",
            _ => self.0.message(),
        };

        (
            status,
            Json(ErrorBody {
                error: kind.as_str(),
                message,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: ClassifiedError) -> (StatusCode, serde_json::Value) {
        let response = AppError::from(err).into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_follows_hint() {
        let (status, body) = render(ClassifiedError::validation("Invalid CPF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION");
        assert_eq!(body["message"], "Invalid CPF");

        let (status, _) = render(ClassifiedError::conflict("cpf already registered")).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = render(ClassifiedError::new(ErrorKind::RemoteFailure, "boom")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unknown_hides_message() {
        let (status, body) =
            render(ClassifiedError::unknown("database error: pool timed out")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}
