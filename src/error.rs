//! Error types for the library server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes returned in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    InvalidInput = 1,
    Unauthenticated = 2,
    Forbidden = 3,
    NotFound = 4,
    DuplicateIdentity = 5,
    LimitReached = 6,
    DuplicateCheckout = 7,
    Unavailable = 8,
    BookOnLoan = 9,
    StorageFailure = 10,
    Internal = 11,
}

/// Per-field validity flags reported when a signup payload is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupValidity {
    pub username_valid: bool,
    pub email_valid: bool,
    pub password_valid: bool,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid signup input")]
    InvalidSignup(SignupValidity),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate identity: {0}")]
    DuplicateIdentity(String),

    #[error("Checkout limit reached. You may only check out up to {0} books.")]
    LimitReached(i64),

    #[error("You may only check out 1 copy of a given book.")]
    DuplicateCheckout,

    #[error("Book is not available for checkout.")]
    Unavailable,

    #[error("Book has {0} active checkout(s) and cannot be deleted")]
    BookOnLoan(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<SignupValidity>,
}

impl AppError {
    /// HTTP status and stable code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Validation(_) | AppError::InvalidSignup(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidInput)
            }
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthenticated),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::DuplicateIdentity(_) => (StatusCode::CONFLICT, ErrorCode::DuplicateIdentity),
            AppError::LimitReached(_) => (StatusCode::BAD_REQUEST, ErrorCode::LimitReached),
            AppError::DuplicateCheckout => (StatusCode::BAD_REQUEST, ErrorCode::DuplicateCheckout),
            AppError::Unavailable => (StatusCode::BAD_REQUEST, ErrorCode::Unavailable),
            AppError::BookOnLoan(_) => (StatusCode::CONFLICT, ErrorCode::BookOnLoan),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::StorageFailure),
            AppError::Configuration(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Internal)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match &self {
            AppError::Validation(msg)
            | AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::DuplicateIdentity(msg) => (msg.clone(), None),
            AppError::InvalidSignup(validity) => ("Invalid input".to_string(), Some(*validity)),
            AppError::LimitReached(_)
            | AppError::DuplicateCheckout
            | AppError::Unavailable
            | AppError::BookOnLoan(_) => (self.to_string(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Database error".to_string(), None)
            }
            AppError::Configuration(msg) | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
