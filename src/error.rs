use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::response::Envelope;

/// Outcome taxonomy shared by every store backend and the moderation engine.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("you do not have permission to modify this record")]
    Forbidden,

    #[error("{0}")]
    InvalidState(String),

    #[error("an account with this email already exists")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("your account is awaiting administrator approval")]
    PendingApproval,

    #[error("your account has been rejected; contact support for details")]
    Rejected,

    #[error("{0}")]
    Validation(String),

    #[error("the record was modified by another request; reload and retry")]
    Conflict,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.into())
    }
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Forbidden => StatusCode::FORBIDDEN,
            StoreError::InvalidState(_) => StatusCode::CONFLICT,
            StoreError::DuplicateEmail => StatusCode::CONFLICT,
            StoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            StoreError::PendingApproval => StatusCode::FORBIDDEN,
            StoreError::Rejected => StatusCode::FORBIDDEN,
            StoreError::Validation(_) => StatusCode::BAD_REQUEST,
            StoreError::Conflict => StatusCode::CONFLICT,
            StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP-facing error: callers always receive an envelope with `success: false`
/// and a displayable message, never a bare protocol error.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        if let StoreError::Backend(inner) = &e {
            error!(error = %inner, "store backend failure");
        }
        Self {
            status: e.status(),
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = %e, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(Envelope::<()>::failure(self.message))).into_response()
    }
}
