use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::{parse_enum, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ConversationRepo,
    },
    models::{Conversation, ConversationStatus, CreateConversation},
};

const SELECT_COLUMNS: &str =
    "SELECT id, subject, status, latest_message_at, archived_at, created_at FROM conversations";

pub struct SqliteConversationRepo {
    pool: SqlitePool,
}

impl SqliteConversationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_conversation(row: &SqliteRow) -> DbResult<Conversation> {
        Ok(Conversation {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            subject: row.get("subject"),
            status: parse_enum::<ConversationStatus>(&row.get::<String, _>("status"))?,
            latest_message_at: row.get("latest_message_at"),
            archived_at: row.get("archived_at"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl ConversationRepo for SqliteConversationRepo {
    async fn create(&self, input: CreateConversation) -> DbResult<Conversation> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO conversations (id, subject, status, latest_message_at, archived_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.subject)
        .bind(input.status.as_str())
        .bind(input.latest_message_at)
        .bind(input.archived_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Conversation {
            id,
            subject: input.subject,
            status: input.status,
            latest_message_at: input.latest_message_at,
            archived_at: input.archived_at,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Conversation>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_conversation).transpose()
    }

    async fn list_unarchived_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE archived_at IS NULL AND latest_message_at < ? \
             ORDER BY latest_message_at ASC LIMIT ?"
        ))
        .bind(cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    async fn archive(&self, id: Uuid, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET archived_at = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(ConversationStatus::Archived.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn list_archived_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE archived_at IS NOT NULL AND archived_at < ? \
             ORDER BY archived_at ASC LIMIT ?"
        ))
        .bind(cutoff)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_conversation).collect()
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> DbResult<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} ORDER BY latest_message_at DESC, id DESC LIMIT ?"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_conversation).collect()
    }
}
