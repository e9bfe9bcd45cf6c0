use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::{ErrorResponse, MessageResponse};

/// Failures of the persistence layer. Never shown to clients.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Failures while persisting a session or issuing its cookie.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// ApiError
///
/// The status-coded outcome of a request that did not succeed. The access policy
/// produces the first three variants; the last two wrap infrastructure failures
/// and surface as a bare 500.
///
/// `MaxViewsExceeded` shares the 401 status with `Unauthorized` but carries a
/// different message, which clients match on.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Maximum pageview limit reached")]
    MaxViewsExceeded,
    #[error("Article not found")]
    NotFound,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::MaxViewsExceeded => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Repository(_) | ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// For endpoints whose failure contract is a status with an empty body
    /// (`/login`, `/check_session`).
    pub fn without_body(self) -> StatusCode {
        self.log_internal();
        self.status()
    }

    fn log_internal(&self) {
        if let ApiError::Repository(_) | ApiError::Session(_) = self {
            tracing::error!(error = %self, "request failed");
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();
        let status = self.status();
        match self {
            ApiError::Unauthorized | ApiError::MaxViewsExceeded => (
                status,
                Json(MessageResponse {
                    message: self.to_string(),
                }),
            )
                .into_response(),
            ApiError::NotFound => (
                status,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            // Internal details stay in the logs.
            ApiError::Repository(_) | ApiError::Session(_) => status.into_response(),
        }
    }
}
