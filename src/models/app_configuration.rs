use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// The application configuration singleton.
///
/// Holds the raw, untyped settings record plus operational timestamps. Exactly
/// one row exists; it is created on first access. The raw settings are turned
/// into a typed [`crate::settings::Settings`] on every operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfiguration {
    pub settings: Map<String, JsonValue>,
    pub last_backup_at: Option<DateTime<Utc>>,
    /// Cursor of the external ticket sync; `None` means "sync from scratch"
    pub last_sync_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
