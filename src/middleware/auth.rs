use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{AuthUser, TokenType};
use crate::error::ApiError;

/// Validates the bearer access token and injects the caller as [`AuthUser`].
///
/// The user must still exist: tokens outlive account deletion.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(|msg| {
        tracing::warn!(path = %request.uri().path(), "Rejected request: {}", msg);
        ApiError::unauthorized(msg)
    })?;

    let claims = state.tokens.decode(token, TokenType::Access)?;

    let user = state
        .users
        .find(claims.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(user_id = claims.user_id, "Token for deleted user");
            ApiError::unauthorized("User not found")
        })?;

    request.extensions_mut().insert(AuthUser::from(&user));
    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .ok_or("Authentication credentials were not provided.")?
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("Empty JWT token"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
