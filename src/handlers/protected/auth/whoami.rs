// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::Extension;

use crate::auth::AuthUser;
use crate::middleware::{ApiResponse, ApiResult};

/// The caller as established by the JWT middleware.
pub async fn whoami_get(Extension(user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}
