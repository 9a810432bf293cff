//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use sessionward_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Wire status string of the error kind.
    pub status: String,
    /// Human-readable message.
    pub message: String,
}

/// An [`AppError`] on its way out of a handler.
///
/// Token clearing is not decided here: the handlers that own the
/// transport attach clearing headers themselves.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error kind.
pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::TryRefreshToken
        | ErrorKind::Unauthorised
        | ErrorKind::UnauthorisedTokenReuse
        | ErrorKind::TokenTheftDetected
        | ErrorKind::MalformedToken
        | ErrorKind::ExpiredToken
        | ErrorKind::SignatureInvalid
        | ErrorKind::SessionNotFound => StatusCode::UNAUTHORIZED,
        ErrorKind::AntiCsrfMismatch => StatusCode::FORBIDDEN,
        ErrorKind::CoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::BadInput => StatusCode::BAD_REQUEST,
        ErrorKind::AlreadyInitialised
        | ErrorKind::NotInitialised
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(self.0.kind);
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Internal server error");
        }

        let body = ApiErrorResponse {
            status: self.0.kind.as_status().to_string(),
            message: self.0.message,
        };

        (status, Json(body)).into_response()
    }
}
