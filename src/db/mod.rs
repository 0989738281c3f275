mod error;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(all(test, feature = "database-sqlite"))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;

use crate::config::DatabaseConfig;

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    conversations: Arc<dyn ConversationRepo>,
    action_logs: Arc<dyn ActionLogRepo>,
    app_configuration: Arc<dyn AppConfigurationRepo>,
    support_data: Arc<dyn SupportDataRepo>,
    users: Arc<dyn UserRepo>,
}

#[cfg(feature = "database-sqlite")]
impl CachedRepos {
    fn sqlite(pool: &sqlx::SqlitePool) -> Self {
        Self {
            conversations: Arc::new(sqlite::SqliteConversationRepo::new(pool.clone())),
            action_logs: Arc::new(sqlite::SqliteActionLogRepo::new(pool.clone())),
            app_configuration: Arc::new(sqlite::SqliteAppConfigurationRepo::new(pool.clone())),
            support_data: Arc::new(sqlite::SqliteSupportDataRepo::new(pool.clone())),
            users: Arc::new(sqlite::SqliteUserRepo::new(pool.clone())),
        }
    }
}

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(not(feature = "database-sqlite"))]
    _None(std::convert::Infallible),
}

/// Pool sizing for a SQLite config.
///
/// Every connection to `:memory:` opens its own empty database, so the
/// in-memory pool holds exactly one connection and never lets it be reaped.
#[cfg(feature = "database-sqlite")]
fn sqlite_pool_options(cfg: &crate::config::SqliteConfig) -> sqlx::sqlite::SqlitePoolOptions {
    let options = sqlx::sqlite::SqlitePoolOptions::new();
    if cfg.is_memory() {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options.max_connections(cfg.max_connections)
    }
}

/// Database pool for the support data store.
///
/// Repositories are cached at construction time to avoid allocation on each access.
pub struct DbPool {
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(pool: sqlx::SqlitePool) -> Self {
        DbPool {
            repos: CachedRepos::sqlite(&pool),
            inner: PoolStorage::Sqlite(pool),
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let options = if cfg.is_memory() {
                    sqlx::sqlite::SqliteConnectOptions::new().in_memory(true)
                } else {
                    sqlx::sqlite::SqliteConnectOptions::new()
                        .filename(&cfg.path)
                        .create_if_missing(cfg.create_if_missing)
                        .journal_mode(if cfg.wal_mode {
                            sqlx::sqlite::SqliteJournalMode::Wal
                        } else {
                            sqlx::sqlite::SqliteJournalMode::Delete
                        })
                };

                let pool = sqlite_pool_options(cfg)
                    .connect_with(
                        options
                            .foreign_keys(true)
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                Ok(Self::from_sqlite(pool))
            }
        }
    }

    /// Run database migrations using sqlx's migration runner
    /// This automatically creates and manages a _sqlx_migrations table
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!("Running SQLite migrations");
                sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
                tracing::info!("SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    /// Get conversation repository
    pub fn conversations(&self) -> Arc<dyn ConversationRepo> {
        Arc::clone(&self.repos.conversations)
    }

    /// Get action log repository
    pub fn action_logs(&self) -> Arc<dyn ActionLogRepo> {
        Arc::clone(&self.repos.action_logs)
    }

    /// Get application configuration repository
    pub fn app_configuration(&self) -> Arc<dyn AppConfigurationRepo> {
        Arc::clone(&self.repos.app_configuration)
    }

    /// Get kind-generic support data repository
    pub fn support_data(&self) -> Arc<dyn SupportDataRepo> {
        Arc::clone(&self.repos.support_data)
    }

    /// Get user repository
    pub fn users(&self) -> Arc<dyn UserRepo> {
        Arc::clone(&self.repos.users)
    }

    /// Health check for database connectivity
    pub async fn health_check(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
                Ok(())
            }
            #[cfg(not(feature = "database-sqlite"))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod pool_tests {
    use super::*;
    use crate::config::SqliteConfig;

    fn sqlite_config(path: &str) -> SqliteConfig {
        toml::from_str(&format!("path = \"{path}\"")).unwrap()
    }

    #[test]
    fn test_memory_pool_keeps_its_connection() {
        let options = sqlite_pool_options(&sqlite_config(":memory:"));
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[test]
    fn test_file_pool_uses_configured_size() {
        let options = sqlite_pool_options(&sqlite_config("steward.db"));
        assert_eq!(options.get_max_connections(), 5);
    }

    #[tokio::test]
    async fn test_memory_database_from_config() {
        let config = DatabaseConfig::Sqlite(sqlite_config(":memory:"));
        let db = DbPool::from_config(&config).await.unwrap();
        db.run_migrations().await.unwrap();

        db.app_configuration().get_or_init().await.unwrap();
        assert!(db.action_logs().list_recent(1).await.unwrap().is_empty());
    }
}
