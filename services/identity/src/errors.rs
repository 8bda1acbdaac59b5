//! Custom error types for the identity service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Error taxonomy for the identity core. Every failure crossing the HTTP
/// boundary maps to a status code plus a JSON message.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Malformed or missing input, client fixable
    #[error("{0}")]
    Validation(String),

    /// Username or email uniqueness violation
    #[error("user with email or username already exists")]
    Conflict,

    /// No such user or channel
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Password mismatch on login
    #[error("invalid user credentials")]
    InvalidCredentials,

    /// No token presented
    #[error("unauthorized request")]
    Unauthorized,

    /// Token failed signature or expiry verification, or names no user
    #[error("invalid token")]
    InvalidToken,

    /// Presented refresh token was already superseded by a rotation
    #[error("refresh token is expired or used")]
    TokenReuse,

    /// The media host did not yield a usable URL
    #[error("media upload failed: {0}")]
    UploadFailed(String),

    /// A dependent service timed out; the caller may retry
    #[error("dependent service unavailable")]
    Unavailable,

    /// Invariant violation or backend failure
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => IdentityError::Conflict,
            StoreError::Other(e) => IdentityError::Internal(e),
        }
    }
}

impl IdentityError {
    fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::Validation(_) | IdentityError::Conflict => StatusCode::BAD_REQUEST,
            IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
            IdentityError::InvalidCredentials
            | IdentityError::Unauthorized
            | IdentityError::InvalidToken
            | IdentityError::TokenReuse => StatusCode::UNAUTHORIZED,
            IdentityError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            IdentityError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            IdentityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Authentication failures and internal errors carry no detail outward
        let message = match &self {
            IdentityError::InvalidCredentials
            | IdentityError::Unauthorized
            | IdentityError::InvalidToken
            | IdentityError::TokenReuse => "Unauthorized".to_string(),
            IdentityError::Internal(e) => {
                tracing::error!("internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for identity results
pub type IdentityResult<T> = Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            IdentityError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(IdentityError::Conflict.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            IdentityError::NotFound("user").status_code(),
            StatusCode::NOT_FOUND
        );
        for auth_err in [
            IdentityError::InvalidCredentials,
            IdentityError::Unauthorized,
            IdentityError::InvalidToken,
            IdentityError::TokenReuse,
        ] {
            assert_eq!(auth_err.status_code(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(
            IdentityError::UploadFailed("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            IdentityError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: IdentityError = crate::store::StoreError::Conflict("chai".into()).into();
        assert!(matches!(err, IdentityError::Conflict));
    }
}
