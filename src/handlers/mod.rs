// handlers/mod.rs - HTTP handlers grouped by access level
//
// public/    - token acquisition, no authentication
// protected/ - everything behind the JWT middleware

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

pub mod protected;
pub mod public;

/// Unwrap a JSON body, reporting malformed input as `INVALID_JSON`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::invalid_json(rejection.body_text())),
    }
}
