use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::SupportDataRepo,
    },
    models::SupportEntity,
};

/// Table names come from [`SupportEntity::table_name`], a closed set, so
/// interpolating them into SQL is safe.
pub struct SqliteSupportDataRepo {
    pool: SqlitePool,
}

impl SqliteSupportDataRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupportDataRepo for SqliteSupportDataRepo {
    async fn list_ids(&self, kind: SupportEntity, limit: u32) -> DbResult<Vec<Uuid>> {
        let rows = sqlx::query(&format!(
            "SELECT id FROM {} ORDER BY created_at ASC LIMIT ?",
            kind.table_name()
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("id")))
            .collect()
    }

    async fn delete(&self, kind: SupportEntity, id: Uuid) -> DbResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table_name()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn exists_any(&self, kind: SupportEntity) -> DbResult<bool> {
        let row = sqlx::query(&format!("SELECT 1 FROM {} LIMIT 1", kind.table_name()))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count(&self, kind: SupportEntity) -> DbResult<i64> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM {}", kind.table_name()))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
