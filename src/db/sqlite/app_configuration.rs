use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};
use sqlx::{Row, SqlitePool};

use crate::{
    db::{
        error::{DbError, DbResult},
        repos::AppConfigurationRepo,
    },
    models::AppConfiguration,
};

/// The singleton row always has this id.
const SINGLETON_ID: i64 = 1;

pub struct SqliteAppConfigurationRepo {
    pool: SqlitePool,
}

impl SqliteAppConfigurationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_row(&self) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO app_configuration (id, settings, updated_at)
            VALUES (?, '{}', ?)
            "#,
        )
        .bind(SINGLETON_ID)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn parse_settings(raw: &str) -> DbResult<Map<String, JsonValue>> {
        match serde_json::from_str::<JsonValue>(raw)? {
            JsonValue::Object(map) => Ok(map),
            JsonValue::Null => Ok(Map::new()),
            other => Err(DbError::Internal(format!(
                "settings column holds a non-object value: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl AppConfigurationRepo for SqliteAppConfigurationRepo {
    async fn get_or_init(&self) -> DbResult<AppConfiguration> {
        self.ensure_row().await?;

        let row = sqlx::query(
            r#"
            SELECT settings, last_backup_at, last_sync_at, updated_at
            FROM app_configuration
            WHERE id = ?
            "#,
        )
        .bind(SINGLETON_ID)
        .fetch_one(&self.pool)
        .await?;

        Ok(AppConfiguration {
            settings: Self::parse_settings(&row.get::<String, _>("settings"))?,
            last_backup_at: row.get("last_backup_at"),
            last_sync_at: row.get("last_sync_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn update_settings(
        &self,
        settings: Map<String, JsonValue>,
    ) -> DbResult<AppConfiguration> {
        self.ensure_row().await?;

        sqlx::query("UPDATE app_configuration SET settings = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&settings)?)
            .bind(Utc::now())
            .bind(SINGLETON_ID)
            .execute(&self.pool)
            .await?;

        self.get_or_init().await
    }

    async fn set_last_backup_at(&self, at: DateTime<Utc>) -> DbResult<()> {
        self.ensure_row().await?;

        sqlx::query("UPDATE app_configuration SET last_backup_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(Utc::now())
            .bind(SINGLETON_ID)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_last_sync_at(&self, at: Option<DateTime<Utc>>) -> DbResult<()> {
        self.ensure_row().await?;

        sqlx::query("UPDATE app_configuration SET last_sync_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(Utc::now())
            .bind(SINGLETON_ID)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
