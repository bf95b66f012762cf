use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One user's score for one kitten. Serialized with the rater and kitten as
/// plain ids under `user` and `kitten`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[serde(rename = "kitten")]
    pub kitten_id: i64,
    pub score: i64,
    pub created_at: DateTime<Utc>,
}
