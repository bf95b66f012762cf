//! Ownership predicates. Pure and side-effect free; callers turn a `false`
//! into [`ServiceError::Forbidden`](super::ServiceError::Forbidden) before
//! mutating anything.

use crate::auth::AuthUser;
use crate::database::{Kitten, Rating};

pub fn can_mutate_kitten(actor: &AuthUser, kitten: &Kitten) -> bool {
    actor.user_id == kitten.owner_id
}

pub fn can_mutate_rating(actor: &AuthUser, rating: &Rating) -> bool {
    actor.user_id == rating.user_id
}
