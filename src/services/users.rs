use std::collections::BTreeSet;

use chrono::Utc;
use tracing::info;

use super::aggregator::AverageRatingAggregator;
use super::ServiceError;
use crate::auth::{hash_password, verify_password};
use crate::database::{Store, User};
use crate::validation::{validate_credentials, ValidationErrors};

const USER_COLUMNS: &str = "id, username, password_hash, created_at";

/// Account registration, lookup and removal
#[derive(Clone, Debug)]
pub struct UserService {
    store: Store,
    password_rounds: u32,
}

impl UserService {
    pub fn new(store: Store, password_rounds: u32) -> Self {
        Self {
            store,
            password_rounds,
        }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, ServiceError> {
        validate_credentials(username, password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username.trim())
        .bind(hash_password(password, self.password_rounds))
        .bind(Utc::now())
        .fetch_one(self.store.pool())
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                ServiceError::Validation(ValidationErrors::single(
                    "username",
                    "A user with that username already exists.",
                ))
            }
            other => other.into(),
        })?;

        info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// The user with these credentials, if any. Unknown usernames and wrong
    /// passwords are indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, ServiceError> {
        let user = self.find_by_username(username.trim()).await?;
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    pub async fn find(&self, user_id: i64) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(self.store.pool())
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = ?",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.store.pool())
        .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))
        .fetch_all(self.store.pool())
        .await?;
        Ok(users)
    }

    /// Remove a user with their kittens and ratings. Kittens the user had
    /// rated get their averages recomputed in the same transaction.
    pub async fn delete(&self, user_id: i64) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;

        let rated: BTreeSet<i64> =
            sqlx::query_scalar::<_, i64>("DELETE FROM ratings WHERE user_id = ? RETURNING kitten_id")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        sqlx::query(
            "DELETE FROM ratings WHERE kitten_id IN (SELECT id FROM kittens WHERE owner_id = ?)",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let owned: Vec<i64> =
            sqlx::query_scalar("DELETE FROM kittens WHERE owner_id = ? RETURNING id")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::NotFound(format!("User {} not found", user_id)));
        }

        // Owners never rate their own kittens, so none of these were just removed
        for kitten_id in &rated {
            AverageRatingAggregator::recompute(&mut tx, *kitten_id).await?;
        }
        tx.commit().await?;

        info!(
            user_id,
            kittens_removed = owned.len(),
            ratings_removed = rated.len(),
            "Deleted user"
        );
        Ok(())
    }
}
