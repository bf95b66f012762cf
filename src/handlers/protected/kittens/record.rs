use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};

use super::kitten_id;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::{Kitten, KittenChanges};
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{require_complete, validate_kitten_changes};

pub async fn kitten_get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Kitten> {
    let kitten = state.catalog.get(kitten_id(path)?).await?;
    Ok(ApiResponse::success(kitten))
}

/// PUT /api/kittens/:id - replace every attribute
pub async fn kitten_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<KittenChanges>, JsonRejection>,
) -> ApiResult<Kitten> {
    let id = kitten_id(path)?;
    let attrs = require_complete(json_body(payload)?)?;
    let kitten = state.catalog.update(&user, id, attrs.into()).await?;
    Ok(ApiResponse::success(kitten))
}

/// PATCH /api/kittens/:id - change only the attributes present in the body
pub async fn kitten_patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<KittenChanges>, JsonRejection>,
) -> ApiResult<Kitten> {
    let id = kitten_id(path)?;
    let changes = json_body(payload)?;
    validate_kitten_changes(&changes)?;
    let kitten = state.catalog.update(&user, id, changes).await?;
    Ok(ApiResponse::success(kitten))
}

pub async fn kitten_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    state.catalog.delete(&user, kitten_id(path)?).await?;
    Ok(ApiResponse::no_content())
}
