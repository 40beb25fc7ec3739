//! Error codes and HTTP error responses.
//!
//! Every layer has its own `thiserror` enum. They all implement [`ErrorCode`]
//! so the HTTP boundary can expose a stable machine-readable code without
//! matching on foreign variants.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::services::session::IdentityError;
use crate::services::tx::MutationError;

pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Failure returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "E_UNAUTHENTICATED",
            Self::Identity(e) => e.error_code(),
            Self::Mutation(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Unauthenticated => false,
            Self::Identity(e) => e.retryable(),
            Self::Mutation(e) => e.retryable(),
        }
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Mutation(e) => mutation_status(e),
        }
    }
}

pub(crate) fn mutation_status(err: &MutationError) -> StatusCode {
    match err {
        MutationError::Validation(_) => StatusCode::BAD_REQUEST,
        MutationError::NotFound { .. } => StatusCode::NOT_FOUND,
        MutationError::Storage(e) if e.retryable() => StatusCode::SERVICE_UNAVAILABLE,
        MutationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
            String::from("internal server error, see logs for details")
        } else {
            tracing::info!(error = %self, code = self.error_code(), "returning error to client");
            self.to_string()
        };
        let body = ErrorBody { code: self.error_code(), message };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
