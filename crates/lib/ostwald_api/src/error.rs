//! Application error types.
//!
//! Errors render as `text/plain` bodies; the browser shows them verbatim.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ostwald_core::chat::ChatError;
use ostwald_core::gateway::GatewayError;
use ostwald_core::store::StoreError;
use ostwald_core::upload::UploadError;
use thiserror::Error;
use tracing::error;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Body for any generation failure other than a malformed response.
pub const GENERATION_FAILED: &str = "Error occurred while generating response";

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Database unavailable: {0}")]
    DbUnavailable(String),

    #[error("Invalid response format from AI model")]
    InvalidModelResponse,

    #[error("Generation failed (status {status:?}): {message}")]
    Generation { status: Option<u16>, message: String },

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::DbUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidModelResponse => StatusCode::INTERNAL_SERVER_ERROR,
            // Only real HTTP error statuses are passed through.
            AppError::Generation { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(m) | AppError::PayloadTooLarge(m) => m.clone(),
            AppError::DbUnavailable(_) => "Database unavailable".to_string(),
            AppError::InvalidModelResponse => self.to_string(),
            AppError::Generation { .. } => GENERATION_FAILED.to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        };
        if status.is_server_error() {
            error!(%status, "{self}");
        }
        (status, message).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::DbUnavailable(e.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::InvalidResponse => AppError::InvalidModelResponse,
            GatewayError::Provider { status, message } => AppError::Generation { status, message },
            GatewayError::Attachment(e) => AppError::Generation {
                status: None,
                message: format!("attachment unreadable: {e}"),
            },
            GatewayError::Config(message) => AppError::Generation {
                status: None,
                message,
            },
        }
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        match e {
            ChatError::Store(e) => AppError::from(e),
            ChatError::Gateway(e) => AppError::from(e),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(e.body_text())
        }
    }
}
