use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use super::{
    GovernanceError, GovernanceResult,
    action_log::{ActionLogService, ActionRecord, actions},
    audit_gate::AuditCategory,
};
use crate::{
    auth::{AccessGuard, Session},
    db::{DbPool, DbResult},
    models::AppConfiguration,
    settings::{self, SettingKey, Settings},
};

/// The configuration record with its settings resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub settings: Settings,
    /// The stored values as entered, before coercion
    pub raw: Map<String, JsonValue>,
    pub last_backup_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<AppConfiguration> for SettingsView {
    fn from(config: AppConfiguration) -> Self {
        Self {
            settings: settings::resolve(&config.settings),
            raw: config.settings,
            last_backup_at: config.last_backup_at,
            last_sync_at: config.last_sync_at,
            updated_at: config.updated_at,
        }
    }
}

/// Reads and edits the settings held in the configuration record.
///
/// Settings are re-resolved on every call; nothing is cached between
/// operations.
#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DbPool>,
    guard: Arc<AccessGuard>,
    action_log: ActionLogService,
}

impl SettingsService {
    pub fn new(db: Arc<DbPool>, guard: Arc<AccessGuard>, action_log: ActionLogService) -> Self {
        Self {
            db,
            guard,
            action_log,
        }
    }

    /// Load the configuration record and resolve its settings.
    pub async fn load(&self) -> DbResult<SettingsView> {
        Ok(self.db.app_configuration().get_or_init().await?.into())
    }

    pub async fn get(&self, session: &Session) -> GovernanceResult<SettingsView> {
        self.guard.require_admin(session).await?;
        Ok(self.load().await?)
    }

    /// Merge `patch` into the stored record.
    ///
    /// Keys must be known setting keys. A `null` value removes the key so it
    /// falls back to its default. Values are stored as given; coercion happens
    /// on read.
    pub async fn update(
        &self,
        session: &Session,
        patch: Map<String, JsonValue>,
    ) -> GovernanceResult<SettingsView> {
        let actor = self.guard.require_admin(session).await?;

        if let Some(unknown) = patch.keys().find(|k| SettingKey::parse(k).is_none()) {
            return Err(GovernanceError::Validation(format!(
                "unknown setting key '{}'",
                unknown
            )));
        }

        let current = self.db.app_configuration().get_or_init().await?;
        let mut raw = current.settings;
        let changed: Vec<String> = patch.keys().cloned().collect();
        for (key, value) in patch {
            if value.is_null() {
                raw.remove(&key);
            } else {
                raw.insert(key, value);
            }
        }

        let view: SettingsView = self.db.app_configuration().update_settings(raw).await?.into();

        tracing::info!(user_id = %actor, keys = ?changed, "Settings updated");

        // Gate with the settings now in force, so disabling config_change
        // auditing is itself not recorded.
        self.action_log
            .record(
                &view.settings,
                ActionRecord {
                    action: actions::SETTINGS_UPDATE,
                    category: AuditCategory::ConfigChange,
                    description: format!("Updated settings: {}", changed.join(", ")),
                    actor: Some(&actor),
                    via: session.via,
                    success: true,
                    metadata: json!({ "keys": changed }),
                },
            )
            .await;

        Ok(view)
    }
}
