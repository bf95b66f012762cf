// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Routes here sit behind `jwt_auth_middleware`, which rejects the request
// with 401 unless it carries a valid access token and otherwise provides
// `Extension<AuthUser>` for the caller.

pub mod auth;
pub mod kittens;
pub mod ratings;
