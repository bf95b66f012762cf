use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::info;

use super::aggregator::AverageRatingAggregator;
use super::{ownership, KittenCatalog, ServiceError};
use crate::auth::AuthUser;
use crate::database::{Rating, Store};
use crate::validation::validate_score;

const RATING_COLUMNS: &str = "id, user_id, kitten_id, score, created_at";

/// Insert a rating row. The UNIQUE (user_id, kitten_id) constraint is what
/// finally decides duplicates when two writers race past the pre-check.
async fn insert_rating(
    conn: &mut SqliteConnection,
    user_id: i64,
    kitten_id: i64,
    score: i64,
) -> Result<Rating, ServiceError> {
    sqlx::query_as::<_, Rating>(&format!(
        "INSERT INTO ratings (user_id, kitten_id, score, created_at) VALUES (?, ?, ?, ?) RETURNING {}",
        RATING_COLUMNS
    ))
    .bind(user_id)
    .bind(kitten_id)
    .bind(score)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => ServiceError::DuplicateRating,
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            ServiceError::kitten_not_found(kitten_id)
        }
        other => other.into(),
    })
}

/// The set of ratings and the rules for changing it.
///
/// Every mutation and the average recompute it triggers share one transaction:
/// either both are visible or neither is.
#[derive(Clone, Debug)]
pub struct RatingLedger {
    store: Store,
    catalog: KittenCatalog,
}

impl RatingLedger {
    pub fn new(store: Store, catalog: KittenCatalog) -> Self {
        Self { store, catalog }
    }

    /// All ratings of a kitten in insertion order. An unknown kitten simply
    /// has no ratings.
    pub async fn list(&self, kitten_id: i64) -> Result<Vec<Rating>, ServiceError> {
        let ratings = sqlx::query_as::<_, Rating>(&format!(
            "SELECT {} FROM ratings WHERE kitten_id = ? ORDER BY id",
            RATING_COLUMNS
        ))
        .bind(kitten_id)
        .fetch_all(self.store.pool())
        .await?;
        Ok(ratings)
    }

    pub async fn find(&self, user_id: i64, kitten_id: i64) -> Result<Option<Rating>, ServiceError> {
        let rating = sqlx::query_as::<_, Rating>(&format!(
            "SELECT {} FROM ratings WHERE user_id = ? AND kitten_id = ?",
            RATING_COLUMNS
        ))
        .bind(user_id)
        .bind(kitten_id)
        .fetch_optional(self.store.pool())
        .await?;
        Ok(rating)
    }

    pub async fn create(
        &self,
        actor: &AuthUser,
        kitten_id: i64,
        score: i64,
    ) -> Result<Rating, ServiceError> {
        let kitten = self.catalog.get(kitten_id).await?;
        // Whoever may mutate the kitten owns it, and owners do not rate
        if ownership::can_mutate_kitten(actor, &kitten) {
            return Err(ServiceError::SelfRating);
        }
        if self.find(actor.user_id, kitten_id).await?.is_some() {
            return Err(ServiceError::DuplicateRating);
        }
        validate_score(score)?;

        let mut tx = self.store.begin().await?;
        let rating = insert_rating(&mut tx, actor.user_id, kitten_id, score).await?;
        let average = AverageRatingAggregator::recompute(&mut tx, kitten_id).await?;
        tx.commit().await?;

        info!(
            kitten_id,
            user_id = actor.user_id,
            score,
            average,
            "Created rating"
        );
        Ok(rating)
    }

    pub async fn update(
        &self,
        actor: &AuthUser,
        kitten_id: i64,
        new_score: i64,
    ) -> Result<Rating, ServiceError> {
        self.catalog.get(kitten_id).await?;
        validate_score(new_score)?;

        let existing = self
            .find(actor.user_id, kitten_id)
            .await?
            .ok_or_else(|| ServiceError::rating_not_found(kitten_id))?;
        if !ownership::can_mutate_rating(actor, &existing) {
            return Err(ServiceError::forbidden());
        }

        let mut tx = self.store.begin().await?;
        let rating = sqlx::query_as::<_, Rating>(&format!(
            "UPDATE ratings SET score = ? WHERE id = ? RETURNING {}",
            RATING_COLUMNS
        ))
        .bind(new_score)
        .bind(existing.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::rating_not_found(kitten_id))?;
        let average = AverageRatingAggregator::recompute(&mut tx, kitten_id).await?;
        tx.commit().await?;

        info!(
            kitten_id,
            user_id = actor.user_id,
            score = new_score,
            average,
            "Updated rating"
        );
        Ok(rating)
    }

    pub async fn delete(&self, actor: &AuthUser, kitten_id: i64) -> Result<(), ServiceError> {
        self.catalog.get(kitten_id).await?;

        let existing = self
            .find(actor.user_id, kitten_id)
            .await?
            .ok_or_else(|| ServiceError::rating_not_found(kitten_id))?;
        if !ownership::can_mutate_rating(actor, &existing) {
            return Err(ServiceError::forbidden());
        }

        let mut tx = self.store.begin().await?;
        let deleted = sqlx::query("DELETE FROM ratings WHERE id = ?")
            .bind(existing.id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::rating_not_found(kitten_id));
        }
        let average = AverageRatingAggregator::recompute(&mut tx, kitten_id).await?;
        tx.commit().await?;

        info!(kitten_id, user_id = actor.user_id, average, "Deleted rating");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregator::mean;
    use crate::testing::TestContext;

    async fn average_of(ctx: &TestContext, kitten_id: i64) -> f64 {
        ctx.catalog.get(kitten_id).await.unwrap().average_rating
    }

    /// The stored average must always equal the mean of the live rating set.
    async fn assert_average_consistent(ctx: &TestContext, kitten_id: i64) {
        let ratings = ctx.ledger.list(kitten_id).await.unwrap();
        let total: i64 = ratings.iter().map(|r| r.score).sum();
        let expected = mean(total, ratings.len() as i64);
        assert_eq!(average_of(ctx, kitten_id).await, expected);
    }

    #[tokio::test]
    async fn rating_lifecycle_scenario() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let a = ctx.create_user("alice").await.unwrap();
        let b = ctx.create_user("bob").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();
        assert_eq!(average_of(&ctx, kitten.id).await, 0.0);

        ctx.ledger.create(&a, kitten.id, 5).await.unwrap();
        assert_eq!(average_of(&ctx, kitten.id).await, 5.0);

        ctx.ledger.create(&b, kitten.id, 1).await.unwrap();
        assert_eq!(average_of(&ctx, kitten.id).await, 3.0);

        let updated = ctx.ledger.update(&a, kitten.id, 3).await.unwrap();
        assert_eq!(updated.score, 3);
        assert_eq!(average_of(&ctx, kitten.id).await, 2.0);

        ctx.ledger.delete(&b, kitten.id).await.unwrap();
        assert_eq!(average_of(&ctx, kitten.id).await, 3.0);

        let remaining = ctx.ledger.list(kitten.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].user_id, a.user_id);
        assert_eq!(remaining[0].score, 3);
    }

    #[tokio::test]
    async fn owner_cannot_rate_own_kitten() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();
        ctx.ledger.create(&rater, kitten.id, 2).await.unwrap();

        let err = ctx.ledger.create(&owner, kitten.id, 4).await.unwrap_err();
        assert!(matches!(err, ServiceError::SelfRating));

        assert_eq!(ctx.ledger.list(kitten.id).await.unwrap().len(), 1);
        assert_eq!(average_of(&ctx, kitten.id).await, 2.0);
    }

    #[tokio::test]
    async fn second_rating_for_same_pair_is_duplicate() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        let first = ctx.ledger.create(&rater, kitten.id, 4).await.unwrap();
        let err = ctx.ledger.create(&rater, kitten.id, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateRating));

        let ratings = ctx.ledger.list(kitten.id).await.unwrap();
        assert_eq!(ratings, vec![first]);
        assert_eq!(average_of(&ctx, kitten.id).await, 4.0);
    }

    #[tokio::test]
    async fn unique_constraint_maps_to_duplicate() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        // Bypass the pre-check, as a racing writer would
        let mut tx = ctx.store.begin().await.unwrap();
        insert_rating(&mut tx, rater.user_id, kitten.id, 3).await.unwrap();
        let err = insert_rating(&mut tx, rater.user_id, kitten.id, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateRating));
    }

    #[tokio::test]
    async fn score_out_of_range_is_rejected() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        for score in [0, 6, -3] {
            let err = ctx.ledger.create(&rater, kitten.id, score).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "score {}", score);
        }
        assert!(ctx.ledger.list(kitten.id).await.unwrap().is_empty());

        ctx.ledger.create(&rater, kitten.id, 5).await.unwrap();
        let err = ctx.ledger.update(&rater, kitten.id, 9).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(average_of(&ctx, kitten.id).await, 5.0);
    }

    #[tokio::test]
    async fn missing_kitten_or_rating_is_not_found() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        assert!(matches!(
            ctx.ledger.create(&rater, 404, 3).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            ctx.ledger.update(&rater, kitten.id, 3).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            ctx.ledger.delete(&rater, kitten.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn deleting_only_rating_resets_average() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        ctx.ledger.create(&rater, kitten.id, 4).await.unwrap();
        ctx.ledger.delete(&rater, kitten.id).await.unwrap();

        assert_eq!(average_of(&ctx, kitten.id).await, 0.0);
        assert!(ctx.ledger.list(kitten.id).await.unwrap().is_empty());
    }

    // Lenient on purpose: no existence check for the kitten when listing.
    #[tokio::test]
    async fn listing_ratings_of_unknown_kitten_is_empty() {
        let ctx = TestContext::new().await.unwrap();
        assert!(ctx.ledger.list(12345).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_recompute_rolls_back_the_rating() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        sqlx::query(
            r#"
            CREATE TRIGGER block_average BEFORE UPDATE OF average_rating ON kittens
            BEGIN SELECT RAISE(ABORT, 'average updates disabled'); END
            "#,
        )
        .execute(ctx.store.pool())
        .await
        .unwrap();

        let err = ctx.ledger.create(&rater, kitten.id, 5).await.unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
        assert!(ctx.ledger.list(kitten.id).await.unwrap().is_empty());
        assert_eq!(average_of(&ctx, kitten.id).await, 0.0);
    }

    #[tokio::test]
    async fn average_tracks_every_mutation() {
        let ctx = TestContext::new().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        let mut raters = Vec::new();
        for i in 0..6 {
            raters.push(ctx.create_user(&format!("rater{}", i)).await.unwrap());
        }

        for (i, rater) in raters.iter().enumerate() {
            ctx.ledger.create(rater, kitten.id, (i as i64 % 5) + 1).await.unwrap();
            assert_average_consistent(&ctx, kitten.id).await;
        }
        for (i, rater) in raters.iter().enumerate().step_by(2) {
            ctx.ledger.update(rater, kitten.id, 5 - (i as i64 % 5)).await.unwrap();
            assert_average_consistent(&ctx, kitten.id).await;
        }
        for rater in raters.iter().skip(1).step_by(2) {
            ctx.ledger.delete(rater, kitten.id).await.unwrap();
            assert_average_consistent(&ctx, kitten.id).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_creates_leave_exactly_one_rating() {
        let ctx = TestContext::on_disk().await.unwrap();
        let owner = ctx.create_user("owner").await.unwrap();
        let rater = ctx.create_user("rater").await.unwrap();
        let kitten = ctx.create_kitten(&owner, "Fluffy").await.unwrap();

        let kitten_id = kitten.id;
        let attempts: Vec<_> = (1..=4)
            .map(|score| {
                let ledger = ctx.ledger.clone();
                let rater = rater.clone();
                tokio::spawn(async move { ledger.create(&rater, kitten_id, score).await })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for outcome in futures::future::join_all(attempts).await {
            match outcome.unwrap() {
                Ok(_) => created += 1,
                Err(ServiceError::DuplicateRating) => duplicates += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(duplicates, 3);

        let ratings = ctx.ledger.list(kitten.id).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_average_consistent(&ctx, kitten.id).await;
    }
}
