use async_trait::async_trait;

use crate::{
    db::error::DbResult,
    models::{UpsertUser, User},
};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: &str) -> DbResult<Option<User>>;

    /// Create the user, or replace display name and roles if it exists.
    async fn upsert(&self, input: UpsertUser) -> DbResult<User>;
}
