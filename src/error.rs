use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ApiError
///
/// The application's error taxonomy, produced by handlers and mapped to HTTP
/// status codes at the boundary. Validation and precondition failures carry a
/// human-readable message; storage failures wrap the underlying driver error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Broken referential precondition, duplicate unique key, or malformed payload.
    #[error("{0}")]
    BadRequest(String),
    /// The requested identifier does not exist.
    #[error("not found")]
    NotFound,
    /// Missing, malformed, or expired bearer token, or bad login credentials.
    #[error("unauthorized")]
    Unauthorized,
    /// The store is unreachable or failed mid-operation. Surfaces as a 500.
    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
    /// Token signing failed. Practically unreachable with an HMAC secret.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    /// Password hashing failed.
    #[error("password hash error: {0}")]
    Hash(argon2::password_hash::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found").into_response(),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
            ApiError::Store(e) => {
                // Log the driver error in full; the client only sees a generic 500.
                tracing::error!("storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            ApiError::Token(e) => {
                tracing::error!("token signing error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
            ApiError::Hash(e) => {
                tracing::error!("password hash error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
