// handlers/public/auth/register.rs - POST /api/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use super::Credentials;
use crate::app::AppState;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct Registered {
    pub id: i64,
    pub username: String,
}

/// POST /api/register - Register new user account
///
/// Input: `{"username": "...", "password": "..."}`. Responds 201 with the new
/// account's id and username; a taken username is a validation error.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Registered> {
    let credentials = json_body(payload)?;
    let user = state
        .users
        .register(&credentials.username, &credentials.password)
        .await?;

    Ok(ApiResponse::created(Registered {
        id: user.id,
        username: user.username,
    }))
}
