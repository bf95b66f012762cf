use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /api/kittens/colors
pub async fn colors_get(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::success(state.catalog.distinct_colors().await?))
}

/// GET /api/kittens/breeds
pub async fn breeds_get(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    Ok(ApiResponse::success(state.catalog.distinct_breeds().await?))
}
