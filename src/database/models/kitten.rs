use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Kitten {
    pub id: i64,
    pub owner_id: i64,
    /// Owner's username
    pub owner: String,
    pub name: String,
    pub breed: String,
    pub color: String,
    pub age_months: i64,
    pub description: String,
    /// Mean score of the kitten's ratings, 0 when unrated
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

/// Attributes for a new kitten. The owner always comes from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewKitten {
    pub name: String,
    pub breed: String,
    pub color: String,
    pub age_months: i64,
    pub description: String,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KittenChanges {
    pub name: Option<String>,
    pub breed: Option<String>,
    pub color: Option<String>,
    pub age_months: Option<i64>,
    pub description: Option<String>,
}

impl KittenChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.breed.is_none()
            && self.color.is_none()
            && self.age_months.is_none()
            && self.description.is_none()
    }
}

impl From<NewKitten> for KittenChanges {
    fn from(kitten: NewKitten) -> Self {
        Self {
            name: Some(kitten.name),
            breed: Some(kitten.breed),
            color: Some(kitten.color),
            age_months: Some(kitten.age_months),
            description: Some(kitten.description),
        }
    }
}
