// handlers/protected/kittens/mod.rs - Kitten catalog handlers
//
// GET    /api/kittens           list (filters: breed, color, min_age, max_age, ordering)
// POST   /api/kittens           create, owned by the caller
// GET    /api/kittens/colors    distinct colors
// GET    /api/kittens/breeds    distinct breeds
// GET    /api/kittens/:id       detail
// PUT    /api/kittens/:id       full update (owner only)
// PATCH  /api/kittens/:id       partial update (owner only)
// DELETE /api/kittens/:id       delete with its ratings (owner only)

use axum::extract::{rejection::PathRejection, Path};

use crate::error::ApiError;

pub mod distinct;
pub mod list;
pub mod record;

pub use distinct::{breeds_get, colors_get};
pub use list::{kittens_get, kittens_post};
pub use record::{kitten_delete, kitten_get, kitten_patch, kitten_put};

/// Kitten id from the path. Ids that do not parse cannot exist.
pub(crate) fn kitten_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::not_found("Kitten not found"))
}
