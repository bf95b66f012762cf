use sqlx::SqliteConnection;
use tracing::debug;

use super::ServiceError;

/// Arithmetic mean of `count` scores summing to `total`; 0 for no scores.
pub fn mean(total: i64, count: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Keeps `kittens.average_rating` equal to the mean of the kitten's ratings.
pub(crate) struct AverageRatingAggregator;

impl AverageRatingAggregator {
    /// Re-aggregate the kitten's ratings and store the mean on the kitten row.
    ///
    /// Runs on the caller's connection so it lands in the same transaction as
    /// the rating change that triggered it.
    pub(crate) async fn recompute(
        conn: &mut SqliteConnection,
        kitten_id: i64,
    ) -> Result<f64, ServiceError> {
        let (count, total): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(score), 0) FROM ratings WHERE kitten_id = ?",
        )
        .bind(kitten_id)
        .fetch_one(&mut *conn)
        .await?;

        let average = mean(total, count);

        let updated = sqlx::query("UPDATE kittens SET average_rating = ? WHERE id = ?")
            .bind(average)
            .bind(kitten_id)
            .execute(&mut *conn)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(ServiceError::kitten_not_found(kitten_id));
        }

        debug!(kitten_id, count, average, "Recomputed average rating");
        Ok(average)
    }
}
