// handlers/protected/auth/logout.rs - POST /api/logout handler

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{AuthError, AuthUser};
use crate::error::ApiError;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// POST /api/logout - Revoke the given refresh token.
///
/// The access token stays valid until it expires. A malformed, foreign or
/// non-refresh token is a 400: the caller is authenticated, the body is wrong.
pub async fn logout_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> ApiResult<()> {
    let request = json_body(payload)?;

    match state.tokens.revoke(&request.refresh_token).await {
        Ok(()) => {}
        Err(AuthError::InvalidToken(_)) | Err(AuthError::WrongTokenType) => {
            return Err(ApiError::bad_request("Invalid or expired token"));
        }
        Err(other) => return Err(other.into()),
    }

    tracing::info!(user_id = user.user_id, "User logged out");
    Ok(ApiResponse::no_content())
}
