use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parlor_db::StoreError;
use parlor_types::api::ErrorResponse;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::credentials::CredentialError;
use crate::session::{SessionError, Unauthorized};

/// Every failure the core can hand to the HTTP boundary.
///
/// Detail carried by a variant is for server logs only; the response body is
/// a fixed string per variant.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad credentials or an invalid, expired or forged token.
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict")]
    Conflict,

    #[error("Store unavailable: {0}")]
    Transient(String),

    #[error("Crypto failure: {0}")]
    CryptoFailure(String),

    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::AuthenticationFailed => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not found"),
            ApiError::Conflict => (StatusCode::CONFLICT, "conflict"),
            ApiError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "service unavailable"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, *msg),
            ApiError::CryptoFailure(_) | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::CryptoFailure(_) | ApiError::Internal(_) => error!("{}", self),
            ApiError::Transient(_) => warn!("{}", self),
            _ => debug!("{}", self),
        }

        let (status, message) = self.status_and_message();
        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ApiError::Conflict,
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Transient(msg) => ApiError::Transient(msg),
            StoreError::Corrupt(_) | StoreError::Pool(_) | StoreError::Database(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("malformed request body")
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        ApiError::CryptoFailure(err.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<Unauthorized> for ApiError {
    fn from(_: Unauthorized) -> Self {
        ApiError::AuthenticationFailed
    }
}
