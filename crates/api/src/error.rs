//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use projections::ProjectionError;
use thiserror::Error;

use crate::response::ApiResponse;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as the standard envelope with `data: null`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed identity headers.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed on this route.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed request outside what the services validate.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The message is logged, never returned.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again.";

impl ApiError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        ApiResponse::<()>::error(status, message).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::Validation(msg) | CheckoutError::State(msg) => {
            (StatusCode::BAD_REQUEST, msg)
        }
        CheckoutError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        CheckoutError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        err @ CheckoutError::Transaction { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        CheckoutError::Store(cause) => {
            tracing::error!(error = %cause, "unsurfaced storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
