// handlers/public/auth/refresh.rs - POST /api/token/refresh handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// POST /api/token/refresh - Exchange a refresh token for a new access token.
/// Revoked, expired and access tokens are all refused with 401.
pub async fn refresh_post(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<AccessToken> {
    let request = json_body(payload)?;
    let access = state.tokens.refresh(&request.refresh).await?;
    Ok(ApiResponse::success(AccessToken { access }))
}
