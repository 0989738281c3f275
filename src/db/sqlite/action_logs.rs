use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ActionLogRepo,
    },
    models::{ActionLogEntry, CreateActionLogEntry, PerformedVia},
};

pub struct SqliteActionLogRepo {
    pool: SqlitePool,
}

impl SqliteActionLogRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &SqliteRow) -> DbResult<ActionLogEntry> {
        let metadata: String = row.get("metadata");
        Ok(ActionLogEntry {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            action: row.get("action"),
            description: row.get("description"),
            performed_at: row.get("performed_at"),
            performed_by: row.get("performed_by"),
            performed_via: parse_enum::<PerformedVia>(&row.get::<String, _>("performed_via"))?,
            success: row.get("success"),
            metadata: serde_json::from_str(&metadata)?,
        })
    }
}

#[async_trait]
impl ActionLogRepo for SqliteActionLogRepo {
    async fn create(&self, input: CreateActionLogEntry) -> DbResult<ActionLogEntry> {
        let id = Uuid::new_v4();
        let performed_at = input.performed_at.unwrap_or_else(Utc::now);
        let metadata = serde_json::to_string(&input.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO action_log (
                id, action, description, performed_at,
                performed_by, performed_via, success, metadata
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.action)
        .bind(&input.description)
        .bind(performed_at)
        .bind(&input.performed_by)
        .bind(input.performed_via.as_str())
        .bind(input.success)
        .bind(&metadata)
        .execute(&self.pool)
        .await?;

        Ok(ActionLogEntry {
            id,
            action: input.action,
            description: input.description,
            performed_at,
            performed_by: input.performed_by,
            performed_via: input.performed_via,
            success: input.success,
            metadata: input.metadata,
        })
    }

    async fn list_recent(&self, limit: u32) -> DbResult<Vec<ActionLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, action, description, performed_at,
                   performed_by, performed_via, success, metadata
            FROM action_log
            ORDER BY performed_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn list_ids_before(&self, cutoff: DateTime<Utc>, limit: u32) -> DbResult<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM action_log
            WHERE performed_at < ?
            ORDER BY performed_at ASC
            LIMIT ?
            "#,
        )
        .bind(cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("id")))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM action_log WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
