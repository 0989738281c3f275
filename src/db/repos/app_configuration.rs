use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue};

use crate::{db::error::DbResult, models::AppConfiguration};

/// Access to the application configuration singleton.
///
/// Exactly one record exists. Every method creates it with empty settings if
/// it is missing, so callers never observe an absent record.
#[async_trait]
pub trait AppConfigurationRepo: Send + Sync {
    async fn get_or_init(&self) -> DbResult<AppConfiguration>;

    /// Replace the raw settings object.
    async fn update_settings(
        &self,
        settings: Map<String, JsonValue>,
    ) -> DbResult<AppConfiguration>;

    async fn set_last_backup_at(&self, at: DateTime<Utc>) -> DbResult<()>;

    /// Set or clear the external sync cursor.
    async fn set_last_sync_at(&self, at: Option<DateTime<Utc>>) -> DbResult<()>;
}
