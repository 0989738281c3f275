use async_trait::async_trait;
use uuid::Uuid;

use crate::{db::error::DbResult, models::SupportEntity};

/// Kind-generic access to support records, used by bulk purges.
#[async_trait]
pub trait SupportDataRepo: Send + Sync {
    /// Up to `limit` ids of the given kind. Order is unspecified; callers
    /// re-query from scratch after deleting.
    async fn list_ids(&self, kind: SupportEntity, limit: u32) -> DbResult<Vec<Uuid>>;

    /// Returns `DbError::NotFound` if the record no longer exists.
    async fn delete(&self, kind: SupportEntity, id: Uuid) -> DbResult<()>;

    /// Whether at least one row of `kind` exists.
    async fn exists_any(&self, kind: SupportEntity) -> DbResult<bool>;

    async fn count(&self, kind: SupportEntity) -> DbResult<i64>;
}
