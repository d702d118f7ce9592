//! Shared, lazily-initialised database handle.
//!
//! [`Database`] is a cheap-to-clone, reference-counted handle around a single [`PgPool`]. The
//! pool is created on first use: the first caller opens the connections and runs migrations,
//! concurrent callers await that same attempt instead of starting their own, and a failed
//! attempt leaves the handle empty so the next caller retries.
//!
//! # Lifecycle
//!
//! ```ignore
//! let db = Database::new(config.database.url.clone(), config.database.pool.clone());
//! db.init().await?;            // connect + migrate at startup
//! let pool = db.pool().await?; // every request
//! db.close().await;            // shutdown
//! ```

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use crate::config::PoolSettings;
use crate::db::errors::{DbError, Result};

#[derive(Clone, Debug)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

#[derive(Debug)]
struct DatabaseInner {
    url: String,
    settings: PoolSettings,
    pool: OnceCell<PgPool>,
}

impl Database {
    /// Create a handle that connects on first use.
    pub fn new(url: impl Into<String>, settings: PoolSettings) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                url: url.into(),
                settings,
                pool: OnceCell::new(),
            }),
        }
    }

    /// Wrap an already connected (and migrated) pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                url: String::new(),
                settings: PoolSettings::default(),
                pool: OnceCell::new_with(Some(pool)),
            }),
        }
    }

    /// Get the pool, connecting and migrating first if nobody has yet.
    pub async fn pool(&self) -> Result<PgPool> {
        let pool = self.inner.pool.get_or_try_init(|| self.connect()).await?;
        Ok(pool.clone())
    }

    /// Connect eagerly. Used at startup so a bad connection string fails fast.
    pub async fn init(&self) -> Result<()> {
        self.pool().await.map(|_| ())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.pool.initialized()
    }

    /// Close all connections. Safe to call on a handle that never connected.
    pub async fn close(&self) {
        if let Some(pool) = self.inner.pool.get() {
            pool.close().await;
        }
    }

    #[instrument(skip(self), err)]
    async fn connect(&self) -> Result<PgPool> {
        let settings = &self.inner.settings;
        let mut options = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs));

        // 0 means "never" for both timeouts
        if settings.idle_timeout_secs > 0 {
            options = options.idle_timeout(Duration::from_secs(settings.idle_timeout_secs));
        }
        if settings.max_lifetime_secs > 0 {
            options = options.max_lifetime(Duration::from_secs(settings.max_lifetime_secs));
        }

        let pool = options.connect(&self.inner.url).await?;
        crate::migrator()
            .run(&pool)
            .await
            .map_err(|e| DbError::Other(anyhow::Error::from(e)))?;

        info!("Database connected successfully");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_from_pool_is_connected(pool: PgPool) {
        let db = Database::from_pool(pool);
        assert!(db.is_connected());

        let pool = db.pool().await.unwrap();
        let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_handle_empty() {
        let settings = PoolSettings {
            acquire_timeout_secs: 1,
            ..Default::default()
        };
        let db = Database::new("postgres://nobody@127.0.0.1:1/none", settings);
        assert!(!db.is_connected());

        assert!(db.pool().await.is_err());
        // A failed attempt must not poison the handle: it stays empty and can be retried.
        assert!(!db.is_connected());
        assert!(db.init().await.is_err());

        // Closing a handle that never connected is a no-op
        db.close().await;
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let db = Database::new("postgres://nobody@127.0.0.1:1/none", PoolSettings::default());
        let clone = db.clone();
        assert!(Arc::ptr_eq(&db.inner, &clone.inner));
    }
}
