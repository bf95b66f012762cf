// handlers/protected/ratings.rs - Ratings of one kitten by the caller
//
// GET    /api/kittens/:id/ratings   every rating of the kitten
// POST   /api/kittens/:id/ratings   rate it: {"score": 1..=5}
// PUT    /api/kittens/:id/ratings   change the caller's score
// DELETE /api/kittens/:id/ratings   withdraw the caller's rating

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Deserialize;

use super::kittens::kitten_id;
use crate::app::AppState;
use crate::auth::AuthUser;
use crate::database::Rating;
use crate::handlers::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{ValidationErrors, REQUIRED};

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub score: Option<i64>,
}

impl ScoreRequest {
    fn score(&self) -> Result<i64, ValidationErrors> {
        self.score
            .ok_or_else(|| ValidationErrors::single("score", REQUIRED))
    }
}

pub async fn ratings_get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<Rating>> {
    let ratings = state.ledger.list(kitten_id(path)?).await?;
    Ok(ApiResponse::success(ratings))
}

pub async fn rating_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> ApiResult<Rating> {
    let id = kitten_id(path)?;
    let score = json_body(payload)?.score()?;
    let rating = state.ledger.create(&user, id, score).await?;
    Ok(ApiResponse::created(rating))
}

pub async fn rating_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> ApiResult<Rating> {
    let id = kitten_id(path)?;
    let score = json_body(payload)?.score()?;
    let rating = state.ledger.update(&user, id, score).await?;
    Ok(ApiResponse::success(rating))
}

pub async fn rating_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    state.ledger.delete(&user, kitten_id(path)?).await?;
    Ok(ApiResponse::no_content())
}
