// handlers/public/auth/login.rs - POST /api/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use super::Credentials;
use crate::app::AppState;
use crate::auth::{AuthError, AuthUser, TokenPair};
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};

/**
 * POST /api/login - Authenticate user and receive JWT tokens
 *
 * Expected Input:
 * ```json
 * { "username": "string", "password": "string" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * { "success": true, "data": { "access": "eyJ...", "refresh": "eyJ..." } }
 * ```
 *
 * Unknown users and wrong passwords both answer 401 with the same message.
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<TokenPair> {
    let credentials = json_body(payload)?;

    let user = match state
        .users
        .authenticate(&credentials.username, &credentials.password)
        .await?
    {
        Some(user) => user,
        None => {
            tracing::warn!(username = %credentials.username, "Failed login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let tokens = state.tokens.issue_pair(&AuthUser::from(&user))?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(ApiResponse::success(tokens))
}
