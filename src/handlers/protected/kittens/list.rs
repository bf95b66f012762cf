use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::{Kitten, KittenChanges};
use crate::error::ApiError;
use crate::filter::KittenFilter;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::require_complete;

/// GET /api/kittens - all kittens matching the query filters, newest first
/// unless `ordering=created_at`.
pub async fn kittens_get(
    State(state): State<AppState>,
    query: Result<Query<KittenFilter>, QueryRejection>,
) -> ApiResult<Vec<Kitten>> {
    let Query(filter) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let kittens = state.catalog.list(&filter).await?;
    Ok(ApiResponse::success(kittens))
}

/// POST /api/kittens - create a kitten owned by the caller. Any owner in the
/// body is ignored.
pub async fn kittens_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<KittenChanges>, JsonRejection>,
) -> ApiResult<Kitten> {
    let attrs = require_complete(json_body(payload)?)?;
    let kitten = state.catalog.create(&user, attrs).await?;
    Ok(ApiResponse::created(kitten))
}
