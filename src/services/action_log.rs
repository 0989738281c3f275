use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::audit_gate::AuditCategory;
use crate::{
    db::{DbPool, DbResult},
    models::{ActionLogEntry, CreateActionLogEntry, PerformedVia},
    settings::Settings,
};

/// Action names recorded by governance operations
pub mod actions {
    /// Scheduled retention enforcement
    pub const RETENTION: &str = "support.retention";
    /// Backup run (scheduled or forced)
    pub const BACKUP: &str = "support.backup";
    /// Whole-tenant purge of support data
    pub const HARD_RESET: &str = "support.hard_reset";
    /// Purge of learned triage examples
    pub const LEARNING_RESET: &str = "support.learning_reset";
    /// Settings record changed
    pub const SETTINGS_UPDATE: &str = "support.settings.update";
    /// Action log exported
    pub const EXPORT_AUDIT_LOGS: &str = "support.export.audit_logs";
    /// Backup snapshot exported
    pub const EXPORT_SNAPSHOT: &str = "support.export.snapshot";
}

/// Who did what, before the outcome is known.
pub struct ActionRecord<'a> {
    /// Use constants from the `actions` module
    pub action: &'a str,
    pub category: AuditCategory,
    pub description: String,
    /// User id, or `None` for system-initiated runs
    pub actor: Option<&'a str>,
    pub via: PerformedVia,
    pub success: bool,
    pub metadata: JsonValue,
}

/// Service layer for the governance action log
#[derive(Clone)]
pub struct ActionLogService {
    db: Arc<DbPool>,
}

impl ActionLogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Newest-first entries.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<ActionLogEntry>> {
        self.db.action_logs().list_recent(limit).await
    }

    /// Append an entry if its category is enabled under `settings`.
    ///
    /// Runs after the operation has completed, so a failed write is logged and
    /// reported as `None` rather than failing the operation.
    pub async fn record(
        &self,
        settings: &Settings,
        record: ActionRecord<'_>,
    ) -> Option<ActionLogEntry> {
        if !record.category.is_enabled(settings) {
            tracing::debug!(
                action = record.action,
                category = %record.category,
                "Audit category disabled, not recording"
            );
            return None;
        }

        let input = CreateActionLogEntry {
            action: record.action.to_string(),
            description: record.description,
            performed_by: record
                .actor
                .unwrap_or(crate::models::SYSTEM_ACTOR)
                .to_string(),
            performed_via: record.via,
            success: record.success,
            metadata: record.metadata,
            performed_at: None,
        };

        match self.db.action_logs().create(input).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::error!(
                    action = record.action,
                    error = %e,
                    "Failed to write action log entry"
                );
                None
            }
        }
    }
}
