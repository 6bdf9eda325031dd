//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! # Response bodies
//!
//! - Validation failures: the flat `{field: message}` map, status 400
//! - Everything else: `{"error": message}`

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::services::password::PasswordError;
use crate::upload::UploadError;
use crate::validation::ValidationErrors;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Submitted fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Resource not found. Carries the client-facing message.
    #[error("Not found: {0}")]
    NotFound(&'static str),

    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Request body could not be read or the upload could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Password hashing failed.
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Upload(err) => match err {
                UploadError::Body { status, .. } => *status,
                UploadError::TooManyFiles | UploadError::UnexpectedFile(_) => {
                    StatusCode::BAD_REQUEST
                }
                UploadError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Store(_) | Self::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        match self {
            Self::Validation(errors) => {
                tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "Validation failed");
                (status, Json(errors)).into_response()
            }
            Self::NotFound(message) => (status, Json(json!({ "error": message }))).into_response(),
            Self::Upload(UploadError::Body { message, .. }) => {
                (status, Json(json!({ "error": message }))).into_response()
            }
            Self::Upload(err @ (UploadError::TooManyFiles | UploadError::UnexpectedFile(_))) => {
                (status, Json(json!({ "error": err.to_string() }))).into_response()
            }
            Self::Store(StoreError::NotFound) => (status, Json(json!({}))).into_response(),
            // Don't expose internal error details to clients
            _ => (status, Json(json!({ "error": "Erro interno do servidor" }))).into_response(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Produto não encontrado");
        assert_eq!(err.to_string(), "Not found: Produto não encontrado");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation(ValidationErrors::new())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("Usuário não encontrado")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::DataCorruption("x".to_owned()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Store(StoreError::IdSpaceExhausted("products"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Upload(UploadError::TooManyFiles)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Upload(UploadError::Body {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                message: "too large".to_owned(),
            })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            get_status(AppError::Password(PasswordError::Hash)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
