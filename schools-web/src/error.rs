use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use schools_core::ValidationFailure;

/// Errors a handler can answer with.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request was rejected before touching storage. Every message is
    /// returned to the caller.
    #[error("{message}: {}", .errors.join("; "))]
    BadRequest {
        message: &'static str,
        errors: Vec<String>,
    },

    #[error("{message}: {cause:#}")]
    Storage {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn invalid(message: &'static str, failure: ValidationFailure) -> Self {
        ApiError::BadRequest {
            message,
            errors: failure.errors,
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: "Invalid request body",
            errors: vec![detail.into()],
        }
    }

    pub fn storage(message: &'static str, cause: anyhow::Error) -> Self {
        ApiError::Storage { message, cause }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest { message, errors } => json!({
                "success": false,
                "message": message,
                "errors": errors,
            }),
            ApiError::Storage { message, cause } => {
                let cause = format!("{:#}", cause);
                error!(error = %cause, "{}", message);
                json!({
                    "success": false,
                    "message": message,
                    "error": cause,
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
