//! Error types for cohort.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Tokens missing")]
    TokensMissing,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Token does not belong to this principal")]
    TokenOwnershipMismatch,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Join request already sent")]
    DuplicateRequest,

    #[error("Group is full")]
    GroupFull,

    #[error("Request not found or already processed")]
    RequestAlreadyProcessed,

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) | Self::RequestAlreadyProcessed => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::TokensMissing | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidRefreshToken | Self::TokenOwnershipMismatch | Self::Forbidden(_) => {
                StatusCode::FORBIDDEN
            }
            Self::BadRequest(_) | Self::Validation(_) | Self::DuplicateRequest | Self::GroupFull => {
                StatusCode::BAD_REQUEST
            }
            Self::Conflict(_) => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::TokensMissing => "TOKENS_MISSING",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::TokenOwnershipMismatch => "TOKEN_OWNERSHIP_MISMATCH",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DuplicateRequest => "DUPLICATE_REQUEST",
            Self::GroupFull => "GROUP_FULL",
            Self::RequestAlreadyProcessed => "REQUEST_ALREADY_PROCESSED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        // Server errors never leak internal detail to the caller.
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::TokensMissing.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidRefreshToken.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::TokenOwnershipMismatch.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::GroupFull.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::DuplicateRequest.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::RequestAlreadyProcessed.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credentials_error_does_not_distinguish_cause() {
        // The same message covers both unknown email and wrong password.
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::GroupFull.error_code(), "GROUP_FULL");
        assert_eq!(AppError::DuplicateRequest.error_code(), "DUPLICATE_REQUEST");
        assert_eq!(
            AppError::RequestAlreadyProcessed.error_code(),
            "REQUEST_ALREADY_PROCESSED"
        );
    }
}
