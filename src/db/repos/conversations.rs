use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{Conversation, CreateConversation},
};

#[async_trait]
pub trait ConversationRepo: Send + Sync {
    async fn create(&self, input: CreateConversation) -> DbResult<Conversation>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Conversation>>;

    /// List conversations with no `archived_at` whose latest message is
    /// strictly older than `cutoff`, oldest first.
    async fn list_unarchived_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Conversation>>;

    /// Mark a conversation archived at `at`.
    ///
    /// Returns `DbError::NotFound` if the conversation no longer exists.
    async fn archive(&self, id: Uuid, at: DateTime<Utc>) -> DbResult<()>;

    /// List conversations archived strictly before `cutoff`, oldest first.
    async fn list_archived_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<Conversation>>;

    /// Delete a conversation. Derived records go with it.
    ///
    /// Returns `DbError::NotFound` if the conversation no longer exists.
    async fn delete(&self, id: Uuid) -> DbResult<()>;

    /// Most recently active conversations first.
    async fn list_recent(&self, limit: u32) -> DbResult<Vec<Conversation>>;
}
