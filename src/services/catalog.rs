use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::info;

use super::{ownership, ServiceError};
use crate::auth::AuthUser;
use crate::database::{DatabaseError, Kitten, KittenChanges, NewKitten, Store};
use crate::filter::KittenFilter;
use crate::validation::ValidationErrors;

const SELECT_KITTEN: &str = r#"
    SELECT k.id, k.owner_id, u.username AS owner, k.name, k.breed, k.color,
           k.age_months, k.description, k.average_rating, k.created_at
    FROM kittens k
    JOIN users u ON u.id = k.owner_id"#;

/// Store-level constraint failures on kitten writes
fn map_write_error(err: sqlx::Error) -> ServiceError {
    let err = DatabaseError::from(err);
    if err.is_check_violation() {
        ServiceError::Validation(ValidationErrors::single(
            "age_months",
            "Age must be a positive number.",
        ))
    } else if err.is_foreign_key_violation() {
        ServiceError::NotFound("Owner account no longer exists".to_string())
    } else {
        ServiceError::Storage(err)
    }
}

async fn fetch(conn: &mut SqliteConnection, kitten_id: i64) -> Result<Option<Kitten>, sqlx::Error> {
    sqlx::query_as::<_, Kitten>(&format!("{} WHERE k.id = ?", SELECT_KITTEN))
        .bind(kitten_id)
        .fetch_optional(conn)
        .await
}

/// Read/write access to kitten records
#[derive(Clone, Debug)]
pub struct KittenCatalog {
    store: Store,
}

impl KittenCatalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn find(&self, kitten_id: i64) -> Result<Option<Kitten>, ServiceError> {
        let mut conn = self.store.pool().acquire().await?;
        Ok(fetch(&mut conn, kitten_id).await?)
    }

    pub async fn get(&self, kitten_id: i64) -> Result<Kitten, ServiceError> {
        self.find(kitten_id)
            .await?
            .ok_or_else(|| ServiceError::kitten_not_found(kitten_id))
    }

    pub async fn list(&self, filter: &KittenFilter) -> Result<Vec<Kitten>, ServiceError> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_KITTEN);
        filter.push_sql(&mut query)?;
        let kittens = query
            .build_query_as::<Kitten>()
            .fetch_all(self.store.pool())
            .await?;
        Ok(kittens)
    }

    /// Insert a kitten owned by `owner`. Attributes are expected to be validated.
    pub async fn create(&self, owner: &AuthUser, attrs: NewKitten) -> Result<Kitten, ServiceError> {
        let mut tx = self.store.begin().await?;

        let kitten_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO kittens (owner_id, name, breed, color, age_months, description, average_rating, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(owner.user_id)
        .bind(&attrs.name)
        .bind(&attrs.breed)
        .bind(&attrs.color)
        .bind(attrs.age_months)
        .bind(&attrs.description)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let kitten = fetch(&mut tx, kitten_id)
            .await?
            .ok_or_else(|| ServiceError::kitten_not_found(kitten_id))?;
        tx.commit().await?;

        info!(kitten_id, owner_id = owner.user_id, "Created kitten");
        Ok(kitten)
    }

    /// Apply `changes` to a kitten the actor owns.
    pub async fn update(
        &self,
        actor: &AuthUser,
        kitten_id: i64,
        changes: KittenChanges,
    ) -> Result<Kitten, ServiceError> {
        let kitten = self.get(kitten_id).await?;
        if !ownership::can_mutate_kitten(actor, &kitten) {
            return Err(ServiceError::forbidden());
        }
        if changes.is_empty() {
            return Ok(kitten);
        }

        let mut tx = self.store.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE kittens SET
                name        = COALESCE(?, name),
                breed       = COALESCE(?, breed),
                color       = COALESCE(?, color),
                age_months  = COALESCE(?, age_months),
                description = COALESCE(?, description)
            WHERE id = ?
            "#,
        )
        .bind(changes.name)
        .bind(changes.breed)
        .bind(changes.color)
        .bind(changes.age_months)
        .bind(changes.description)
        .bind(kitten_id)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;
        if updated.rows_affected() == 0 {
            return Err(ServiceError::kitten_not_found(kitten_id));
        }

        let kitten = fetch(&mut tx, kitten_id)
            .await?
            .ok_or_else(|| ServiceError::kitten_not_found(kitten_id))?;
        tx.commit().await?;

        info!(kitten_id, "Updated kitten");
        Ok(kitten)
    }

    /// Delete a kitten the actor owns, together with its ratings.
    pub async fn delete(&self, actor: &AuthUser, kitten_id: i64) -> Result<(), ServiceError> {
        let kitten = self.get(kitten_id).await?;
        if !ownership::can_mutate_kitten(actor, &kitten) {
            return Err(ServiceError::forbidden());
        }

        let mut tx = self.store.begin().await?;

        let ratings = sqlx::query("DELETE FROM ratings WHERE kitten_id = ?")
            .bind(kitten_id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM kittens WHERE id = ?")
            .bind(kitten_id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::kitten_not_found(kitten_id));
        }
        tx.commit().await?;

        info!(
            kitten_id,
            ratings_removed = ratings.rows_affected(),
            "Deleted kitten"
        );
        Ok(())
    }

    /// Distinct lower-cased colors, sorted.
    pub async fn distinct_colors(&self) -> Result<Vec<String>, ServiceError> {
        Ok(
            sqlx::query_scalar("SELECT DISTINCT LOWER(color) FROM kittens ORDER BY 1")
                .fetch_all(self.store.pool())
                .await?,
        )
    }

    /// Distinct lower-cased breeds, sorted.
    pub async fn distinct_breeds(&self) -> Result<Vec<String>, ServiceError> {
        Ok(
            sqlx::query_scalar("SELECT DISTINCT LOWER(breed) FROM kittens ORDER BY 1")
                .fetch_all(self.store.pool())
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_kitten, TestContext};

    #[tokio::test]
    async fn create_sets_owner_and_zero_average() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("testuser").await.unwrap();

        let kitten = ctx
            .catalog
            .create(&owner, new_kitten("Fluffy", "Persian", "White", 2))
            .await
            .unwrap();

        assert_eq!(kitten.owner_id, owner.user_id);
        assert_eq!(kitten.owner, "testuser");
        assert_eq!(kitten.average_rating, 0.0);
        assert_eq!(ctx.catalog.get(kitten.id).await.unwrap(), kitten);
    }

    #[tokio::test]
    async fn get_missing_kitten_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        assert!(matches!(
            ctx.catalog.get(99).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        let changes = KittenChanges {
            name: Some("Fluffy Updated".to_string()),
            age_months: Some(3),
            ..Default::default()
        };
        let updated = ctx.catalog.update(&owner, kitten.id, changes).await.unwrap();

        assert_eq!(updated.name, "Fluffy Updated");
        assert_eq!(updated.age_months, 3);
        assert_eq!(updated.breed, kitten.breed);
        assert_eq!(updated.color, kitten.color);
        assert_eq!(updated.created_at, kitten.created_at);
        assert_eq!(updated.owner_id, kitten.owner_id);
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let stranger = ctx.create_user("stranger").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        let changes = KittenChanges {
            name: Some("Stolen".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ctx.catalog.update(&stranger, kitten.id, changes).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ctx.catalog.delete(&stranger, kitten.id).await,
            Err(ServiceError::Forbidden(_))
        ));

        assert_eq!(ctx.catalog.get(kitten.id).await.unwrap(), kitten);
    }

    #[tokio::test]
    async fn delete_removes_ratings_too() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();
        ctx.ledger.create(&rater, kitten.id, 5).await.unwrap();

        ctx.catalog.delete(&owner, kitten.id).await.unwrap();

        assert!(ctx.catalog.find(kitten.id).await.unwrap().is_none());
        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
            .fetch_one(ctx.store.pool())
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn negative_age_hits_store_constraint() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();

        let err = ctx
            .catalog
            .create(&owner, new_kitten("Fluffy", "Persian", "White", -1))
            .await
            .unwrap_err();
        match err {
            ServiceError::Validation(errors) => assert!(errors.get("age_months").is_some()),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn list_filters_case_insensitively() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        ctx.catalog
            .create(&owner, new_kitten("Fluffy", "Persian", "White", 2))
            .await
            .unwrap();
        ctx.catalog
            .create(&owner, new_kitten("Shadow", "Siamese", "black", 6))
            .await
            .unwrap();
        ctx.catalog
            .create(&owner, new_kitten("Snow", "persian", "WHITE", 12))
            .await
            .unwrap();

        let filter = KittenFilter {
            breed: Some("PERSIAN".to_string()),
            ..Default::default()
        };
        let names: Vec<String> = ctx
            .catalog
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(names, vec!["Snow", "Fluffy"]);

        let padded = KittenFilter {
            breed: Some("Persian ".to_string()),
            ..Default::default()
        };
        assert!(ctx.catalog.list(&padded).await.unwrap().is_empty());

        let filter = KittenFilter {
            min_age: Some(3),
            max_age: Some(12),
            ordering: Some("created_at".to_string()),
            ..Default::default()
        };
        let names: Vec<String> = ctx
            .catalog
            .list(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(names, vec!["Shadow", "Snow"]);

        assert_eq!(ctx.catalog.distinct_colors().await.unwrap(), vec!["black", "white"]);
        assert_eq!(ctx.catalog.distinct_breeds().await.unwrap(), vec!["persian", "siamese"]);
    }
}
