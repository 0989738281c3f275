use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Database configuration.
///
/// The database holds the support data (conversations and their derived
/// records), the action log, and the application configuration record.
/// Without a `[database]` section the service runs without one: health and
/// configuration checks work, governance operations do not.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// No database. Only configuration checks are possible.
    #[default]
    None,

    /// SQLite database.
    #[cfg(feature = "database-sqlite")]
    Sqlite(SqliteConfig),
}

impl DatabaseConfig {
    pub fn is_none(&self) -> bool {
        matches!(self, DatabaseConfig::None)
    }

    /// Whether migrations should run at startup.
    pub fn run_migrations(&self) -> bool {
        match self {
            DatabaseConfig::None => false,
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.run_migrations,
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DatabaseConfig::None => Ok(()),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(c) => c.validate(),
        }
    }
}

/// SQLite configuration.
#[cfg(feature = "database-sqlite")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the SQLite database file.
    /// Use `:memory:` for an in-memory database (testing only).
    /// Default: `steward.db`
    #[serde(default = "default_sqlite_path")]
    pub path: String,

    /// Create the database file if it doesn't exist.
    #[serde(default = "default_true")]
    pub create_if_missing: bool,

    /// Run migrations on startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_sqlite_max_connections")]
    pub max_connections: u32,
}

#[cfg(feature = "database-sqlite")]
impl SqliteConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::Validation(
                "SQLite path cannot be empty".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn is_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

#[cfg(feature = "database-sqlite")]
fn default_sqlite_path() -> String {
    "steward.db".to_string()
}

#[cfg(feature = "database-sqlite")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "database-sqlite")]
fn default_busy_timeout() -> u64 {
    5000
}

#[cfg(feature = "database-sqlite")]
fn default_sqlite_max_connections() -> u32 {
    5
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sqlite() {
        let config: DatabaseConfig = toml::from_str(
            r#"
            type = "sqlite"
            path = "/var/lib/steward/steward.db"
            max_connections = 2
        "#,
        )
        .unwrap();

        match config {
            DatabaseConfig::Sqlite(c) => {
                assert_eq!(c.path, "/var/lib/steward/steward.db");
                assert_eq!(c.max_connections, 2);
                assert!(c.run_migrations);
                assert!(c.wal_mode);
                assert!(!c.is_memory());
            }
            DatabaseConfig::None => panic!("expected sqlite config"),
        }
    }

    #[test]
    fn test_sqlite_path_defaults() {
        let config: DatabaseConfig = toml::from_str(r#"type = "sqlite""#).unwrap();

        match config {
            DatabaseConfig::Sqlite(c) => {
                assert_eq!(c.path, "steward.db");
                assert_eq!(c.max_connections, 5);
                assert!(c.run_migrations);
                assert!(config_validates(&DatabaseConfig::Sqlite(c)));
            }
            DatabaseConfig::None => panic!("expected sqlite config"),
        }
    }

    fn config_validates(config: &DatabaseConfig) -> bool {
        config.validate().is_ok()
    }

    #[test]
    fn test_empty_path_rejected() {
        let config: DatabaseConfig = toml::from_str(
            r#"
            type = "sqlite"
            path = ""
        "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_is_none() {
        let config = DatabaseConfig::default();
        assert!(config.is_none());
        assert!(!config.run_migrations());
    }
}
