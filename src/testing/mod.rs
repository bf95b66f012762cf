use std::path::PathBuf;

use tempfile::TempDir;

use crate::auth::AuthUser;
use crate::config::DatabaseConfig;
use crate::database::{Kitten, NewKitten, Store};
use crate::services::{KittenCatalog, RatingLedger, UserService};

/// Services wired to a private, migrated database
pub struct TestContext {
    pub store: Store,
    pub catalog: KittenCatalog,
    pub ledger: RatingLedger,
    pub users: UserService,
    // Declared after `store` so the pool drops before the directory goes.
    db_dir: Option<TempDir>,
}

impl TestContext {
    /// In-memory database; gone once the context drops.
    pub async fn new() -> anyhow::Result<Self> {
        let store = Store::in_memory().await?;
        Self::with_store(store, None).await
    }

    /// Database file in a private temp directory with a real multi-connection
    /// pool, for tests that need concurrent writers. The directory, WAL files
    /// included, is removed when the context drops.
    pub async fn on_disk() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new().prefix("kitten_test_").tempdir()?;
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("kittens.db").display()),
            max_connections: 8,
            connection_timeout: 10,
            busy_timeout_ms: 10_000,
        };
        let store = Store::connect(&config).await?;
        Self::with_store(store, Some(dir)).await
    }

    async fn with_store(store: Store, db_dir: Option<TempDir>) -> anyhow::Result<Self> {
        store.migrate().await?;
        let catalog = KittenCatalog::new(store.clone());
        Ok(Self {
            ledger: RatingLedger::new(store.clone(), catalog.clone()),
            users: UserService::new(store.clone(), 1_000),
            catalog,
            store,
            db_dir,
        })
    }

    pub async fn create_user(&self, username: &str) -> anyhow::Result<AuthUser> {
        let user = self.users.register(username, "password123").await?;
        Ok(AuthUser::from(&user))
    }

    pub async fn create_kitten(&self, owner: &AuthUser, name: &str) -> anyhow::Result<Kitten> {
        let kitten = self
            .catalog
            .create(owner, new_kitten(name, "Persian", "White", 2))
            .await?;
        Ok(kitten)
    }

    /// Directory holding the on-disk database, if any.
    pub fn db_dir(&self) -> Option<PathBuf> {
        self.db_dir.as_ref().map(|dir| dir.path().to_path_buf())
    }
}

pub fn new_kitten(name: &str, breed: &str, color: &str, age_months: i64) -> NewKitten {
    NewKitten {
        name: name.to_string(),
        breed: breed.to_string(),
        color: color.to_string(),
        age_months,
        description: format!("{} the {} kitten", name, breed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn on_disk_database_is_removed_on_drop() {
        let ctx = TestContext::on_disk().await.unwrap();
        ctx.create_user("alice").await.unwrap();

        let dir = ctx.db_dir().unwrap();
        assert!(dir.join("kittens.db").exists());

        drop(ctx);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn on_disk_database_is_removed_after_a_panic() {
        let dir = std::sync::Arc::new(std::sync::Mutex::new(None));
        let seen = dir.clone();

        let outcome = tokio::spawn(async move {
            let ctx = TestContext::on_disk().await.unwrap();
            ctx.create_user("alice").await.unwrap();
            *seen.lock().unwrap() = ctx.db_dir();
            panic!("test body failed");
        })
        .await;
        assert!(outcome.unwrap_err().is_panic());

        let dir = dir.lock().unwrap().clone().unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn in_memory_context_has_no_directory() {
        let ctx = TestContext::new().await.unwrap();
        assert!(ctx.db_dir().is_none());
    }
}
