use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the Store
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation())
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.is_foreign_key_violation())
    }

    pub fn is_check_violation(&self) -> bool {
        matches!(self, DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.is_check_violation())
    }
}

/// Schema statements, applied in order by `Store::migrate`.
///
/// Uniqueness of (user_id, kitten_id) lives here so concurrent writers are
/// rejected by the database itself.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        username      TEXT    NOT NULL UNIQUE,
        password_hash TEXT    NOT NULL,
        created_at    TEXT    NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS kittens (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name           TEXT    NOT NULL,
        breed          TEXT    NOT NULL,
        color          TEXT    NOT NULL,
        age_months     INTEGER NOT NULL CHECK (age_months >= 0),
        description    TEXT    NOT NULL,
        average_rating REAL    NOT NULL DEFAULT 0,
        created_at     TEXT    NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_kittens_owner ON kittens(owner_id)",
    r#"
    CREATE TABLE IF NOT EXISTS ratings (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        kitten_id  INTEGER NOT NULL REFERENCES kittens(id) ON DELETE CASCADE,
        score      INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
        created_at TEXT    NOT NULL,
        UNIQUE (user_id, kitten_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_ratings_kitten ON ratings(kitten_id)",
    r#"
    CREATE TABLE IF NOT EXISTS revoked_tokens (
        jti        TEXT    PRIMARY KEY,
        user_id    INTEGER NOT NULL,
        expires_at INTEGER NOT NULL,
        revoked_at TEXT    NOT NULL
    )
    "#,
];

/// Handle to the kitten database. Cheap to clone; all clones share one pool.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open a pool for the configured database URL, creating the file if needed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl(config.url.clone()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        info!("Created database pool for: {}", config.url);
        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests and throwaway runs.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Every new connection to :memory: is a fresh database, so pin one
        // connection for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Database schema is up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DatabaseError> {
        Ok(self.pool.begin().await?)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}
