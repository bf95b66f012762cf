use thiserror::Error;

use crate::database::DatabaseError;
use crate::validation::ValidationErrors;

/// Errors raised by the kitten, rating and user services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    /// The caller is authenticated but may not touch this record
    #[error("{0}")]
    Forbidden(String),

    #[error("You cannot rate your own kitten.")]
    SelfRating,

    #[error("You have already rated this kitten.")]
    DuplicateRating,

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Storage(DatabaseError::Sqlx(err))
    }
}

impl ServiceError {
    pub fn kitten_not_found(kitten_id: i64) -> Self {
        ServiceError::NotFound(format!("Kitten {} not found", kitten_id))
    }

    pub fn rating_not_found(kitten_id: i64) -> Self {
        ServiceError::NotFound(format!("You have not rated kitten {}", kitten_id))
    }

    pub fn forbidden() -> Self {
        ServiceError::Forbidden("You do not have permission to perform this action.".to_string())
    }
}
