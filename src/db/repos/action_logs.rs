use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{ActionLogEntry, CreateActionLogEntry},
};

#[async_trait]
pub trait ActionLogRepo: Send + Sync {
    /// Append an entry. `performed_at` defaults to now.
    async fn create(&self, input: CreateActionLogEntry) -> DbResult<ActionLogEntry>;

    /// Newest entries first.
    async fn list_recent(&self, limit: u32) -> DbResult<Vec<ActionLogEntry>>;

    // ==================== Retention Operations ====================

    /// IDs of entries performed strictly before `cutoff`, oldest first.
    async fn list_ids_before(&self, cutoff: DateTime<Utc>, limit: u32) -> DbResult<Vec<Uuid>>;

    /// Returns `DbError::NotFound` if the entry no longer exists.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
