use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

use super::record::{validate, UserRecord};

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub message: &'static str,
    pub data: UserRecord,
}

/// POST /api/users: validate a user record and echo it back.
/// The record is not stored anywhere.
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), ApiError> {
    let Json(raw) = body?;

    let record = validate(&state.user_schema, &raw).inspect_err(|err| {
        tracing::debug!(
            violations = err.violations().len(),
            "User record rejected"
        );
    })?;

    tracing::info!(record = ?record, "Validated user record");

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User created successfully!",
            data: record,
        }),
    ))
}
