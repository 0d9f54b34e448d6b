use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::users::{ValidationError, Violation};

/// Errors surfaced by HTTP handlers. Each variant maps to exactly one
/// response shape; nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Parseable input that broke schema rules.
    #[error("invalid data: {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// Body could not be read as JSON at all.
    #[error("malformed request body: {reason}")]
    MalformedBody { status: StatusCode, reason: String },

    /// Server-side fault; details are logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody {
            status: rejection.status(),
            reason: rejection.body_text(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Rejected(violations) => ApiError::Validation(violations),
            ValidationError::Schema(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(violations) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Invalid data",
                    "details": violations,
                })),
            )
                .into_response(),
            ApiError::MalformedBody { status, reason } => {
                tracing::debug!(status = %status, reason = %reason, "Rejected malformed body");
                (
                    status,
                    Json(json!({
                        "message": "Malformed request body",
                        "details": [{ "message": reason }],
                    })),
                )
                    .into_response()
            }
            ApiError::Internal(reason) => {
                tracing::error!(reason = %reason, "Internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
