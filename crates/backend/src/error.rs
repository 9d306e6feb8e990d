//! Unified error handling for the backend API.
//!
//! Handlers return `ApiResult` and use `?` on domain errors; the conversion
//! into a status code and JSON body happens here, in one place.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthFailure;
use crate::db::GeoError;
use crate::services::UpstreamError;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body is not the JSON we expect
    #[error("Invalid JSON: {0}")]
    JsonBody(#[from] JsonRejection),

    /// Credential missing, malformed, rejected, or not verifiable right now
    #[error("Unauthorized: {0}")]
    Auth(AuthFailure),

    /// Weather or geocoding service failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Geo dataset could not be read
    #[error("Geo database unavailable: {0}")]
    StoreUnavailable(String),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<GeoError> for ApiError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::NotFound(msg) => ApiError::NotFound(msg),
            GeoError::Validation(msg) => ApiError::BadRequest(msg),
            GeoError::StoreUnavailable(msg) => ApiError::StoreUnavailable(msg),
        }
    }
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        ApiError::Auth(failure)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ApiError::JsonBody(rejection) => {
                tracing::warn!("Rejected request body: {}", rejection.body_text());
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid request body".to_string(),
                    Some(rejection.body_text()),
                )
            }
            ApiError::Auth(AuthFailure::VerificationUnavailable) => {
                tracing::error!("Credential verification unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Authentication service unavailable".to_string(),
                    None,
                )
            }
            ApiError::Auth(failure) => {
                // The reason stays in the logs so it can't be used to probe credentials.
                tracing::warn!("Authentication failed: {}", failure);
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None)
            }
            ApiError::Upstream(e) => {
                tracing::error!("Upstream error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Upstream service failure".to_string(),
                    None,
                )
            }
            ApiError::StoreUnavailable(msg) => {
                tracing::error!("Geo database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Geo database unavailable".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
