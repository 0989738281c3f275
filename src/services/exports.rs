//! Audit log and backup snapshot exports.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    GovernanceError, GovernanceResult,
    action_log::{ActionLogService, ActionRecord, actions},
    audit_gate::AuditCategory,
    settings::SettingsService,
};
use crate::{
    auth::{AccessGuard, Session},
    db::DbPool,
    models::{ActionLogEntry, Conversation, SupportEntity},
    settings::Settings,
};

/// Most conversations included in a backup snapshot.
pub const SNAPSHOT_CONVERSATION_LIMIT: u32 = 5000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }
}

/// A rendered export ready to be served as an attachment.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
    pub count: usize,
}

/// Flattened action log row for CSV export
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditLogRow<'a> {
    id: String,
    action: &'a str,
    action_description: &'a str,
    performed_at: String,
    performed_by: &'a str,
    performed_via: &'a str,
    success: bool,
    metadata: String,
}

impl<'a> From<&'a ActionLogEntry> for AuditLogRow<'a> {
    fn from(entry: &'a ActionLogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            action: &entry.action,
            action_description: &entry.description,
            performed_at: entry.performed_at.to_rfc3339(),
            performed_by: &entry.performed_by,
            performed_via: entry.performed_via.as_str(),
            success: entry.success,
            metadata: entry.metadata.to_string(),
        }
    }
}

/// Render action log entries as CSV.
///
/// Fields containing a comma, a double quote, or a line break are quoted,
/// with embedded quotes doubled.
pub fn audit_logs_csv(entries: &[ActionLogEntry]) -> Result<String, GovernanceError> {
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(vec![]);
    for entry in entries {
        wtr.serialize(AuditLogRow::from(entry))
            .map_err(|e| GovernanceError::Internal(format!("CSV export failed: {}", e)))?;
    }
    let data = wtr
        .into_inner()
        .map_err(|e| GovernanceError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(data)
        .map_err(|e| GovernanceError::Internal(format!("CSV export failed: {}", e)))
}

/// Render action log entries as a pretty JSON document.
pub fn audit_logs_json(
    entries: &[ActionLogEntry],
    exported_at: DateTime<Utc>,
) -> Result<String, GovernanceError> {
    serde_json::to_string_pretty(&json!({
        "exportedAt": exported_at,
        "count": entries.len(),
        "rows": entries,
    }))
    .map_err(|e| GovernanceError::Internal(format!("JSON export failed: {}", e)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub exported_at: DateTime<Utc>,
    pub settings: Settings,
    pub last_backup_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub counts: BTreeMap<SupportEntity, i64>,
    pub conversations: Vec<Conversation>,
}

#[derive(Clone)]
pub struct ExportService {
    db: Arc<DbPool>,
    guard: Arc<AccessGuard>,
    settings: SettingsService,
    action_log: ActionLogService,
}

impl ExportService {
    pub fn new(
        db: Arc<DbPool>,
        guard: Arc<AccessGuard>,
        settings: SettingsService,
        action_log: ActionLogService,
    ) -> Self {
        Self {
            db,
            guard,
            settings,
            action_log,
        }
    }

    /// Gate shared by every export: admin first, then the export policy.
    async fn authorize(&self, session: &Session) -> GovernanceResult<(String, Settings)> {
        let actor = self.guard.require_admin(session).await?;
        let settings = self.settings.load().await?.settings;
        if !settings.allow_data_export {
            tracing::warn!(user_id = %actor, "Export attempted while exports are disabled");
            return Err(GovernanceError::PolicyViolation(
                "data export is disabled".to_string(),
            ));
        }
        Ok((actor, settings))
    }

    /// Export the newest `limit` action log entries.
    pub async fn audit_logs(
        &self,
        session: &Session,
        limit: u32,
        format: ExportFormat,
    ) -> GovernanceResult<ExportFile> {
        let (actor, settings) = self.authorize(session).await?;
        let entries = self.action_log.list_recent(limit).await?;
        let now = Utc::now();

        let body = match format {
            ExportFormat::Csv => audit_logs_csv(&entries)?,
            ExportFormat::Json => audit_logs_json(&entries, now)?,
        };

        self.action_log
            .record(
                &settings,
                ActionRecord {
                    action: actions::EXPORT_AUDIT_LOGS,
                    category: AuditCategory::Export,
                    description: format!(
                        "Exported {} action log entries as {}",
                        entries.len(),
                        format.as_str()
                    ),
                    actor: Some(&actor),
                    via: session.via,
                    success: true,
                    metadata: json!({
                        "format": format.as_str(),
                        "limit": limit,
                        "count": entries.len(),
                    }),
                },
            )
            .await;

        Ok(ExportFile {
            filename: format!(
                "support-audit-logs-{}.{}",
                now.format("%Y%m%d-%H%M%S"),
                format.as_str()
            ),
            content_type: format.content_type(),
            body,
            count: entries.len(),
        })
    }

    /// Export the settings, per-kind row counts and recent conversations.
    pub async fn backup_snapshot(&self, session: &Session) -> GovernanceResult<ExportFile> {
        let (actor, settings) = self.authorize(session).await?;
        let config = self.db.app_configuration().get_or_init().await?;
        let support_data = self.db.support_data();

        let mut counts = BTreeMap::new();
        for kind in SupportEntity::ALL {
            counts.insert(kind, support_data.count(kind).await?);
        }
        let conversations = self
            .db
            .conversations()
            .list_recent(SNAPSHOT_CONVERSATION_LIMIT)
            .await?;

        let snapshot = BackupSnapshot {
            exported_at: Utc::now(),
            settings: settings.clone(),
            last_backup_at: config.last_backup_at,
            last_sync_at: config.last_sync_at,
            counts,
            conversations,
        };
        let body = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| GovernanceError::Internal(format!("Snapshot export failed: {}", e)))?;

        self.action_log
            .record(
                &settings,
                ActionRecord {
                    action: actions::EXPORT_SNAPSHOT,
                    category: AuditCategory::Export,
                    description: format!(
                        "Exported backup snapshot with {} conversations",
                        snapshot.conversations.len()
                    ),
                    actor: Some(&actor),
                    via: session.via,
                    success: true,
                    metadata: json!({ "counts": snapshot.counts }),
                },
            )
            .await;

        Ok(ExportFile {
            filename: format!(
                "support-backup-{}.json",
                snapshot.exported_at.format("%Y%m%d-%H%M%S")
            ),
            content_type: ExportFormat::Json.content_type(),
            body,
            count: snapshot.conversations.len(),
        })
    }
}


#[cfg(all(test, feature = "database-sqlite"))]
mod service_tests {
    use serde_json::{Value as JsonValue, json};

    use super::*;
    use crate::{
        db::tests::harness::insert_support_rows,
        services::testing::{admin_session, agent_session, fixture},
    };

    #[tokio::test]
    async fn test_audit_log_export_records_itself() {
        let (_, db, services) = fixture().await;
        services.backup.run_scheduled().await.unwrap();

        let file = services
            .exports
            .audit_logs(&admin_session(), 500, ExportFormat::Csv)
            .await
            .unwrap();

        assert_eq!(file.count, 1);
        assert!(file.filename.ends_with(".csv"));
        assert!(file.body.contains("support.backup"));

        let entries = db.action_logs().list_recent(10).await.unwrap();
        assert_eq!(entries[0].action, actions::EXPORT_AUDIT_LOGS);
    }

    #[tokio::test]
    async fn test_exports_disabled_is_policy_violation() {
        let (_, db, services) = fixture().await;
        db.app_configuration()
            .update_settings(json!({"allow_data_export": false}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let logs = services
            .exports
            .audit_logs(&admin_session(), 10, ExportFormat::Json)
            .await;
        let snapshot = services.exports.backup_snapshot(&admin_session()).await;

        assert!(matches!(logs, Err(GovernanceError::PolicyViolation(_))));
        assert!(matches!(snapshot, Err(GovernanceError::PolicyViolation(_))));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_export() {
        let (_, _, services) = fixture().await;
        let err = services
            .exports
            .audit_logs(&agent_session(), 10, ExportFormat::Csv)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Auth(_)));
    }

    #[tokio::test]
    async fn test_snapshot_counts_every_kind() {
        let (pool, _, services) = fixture().await;
        insert_support_rows(&pool, SupportEntity::Message, 2).await;
        insert_support_rows(&pool, SupportEntity::LearningExample, 3).await;

        let file = services
            .exports
            .backup_snapshot(&admin_session())
            .await
            .unwrap();
        let parsed: JsonValue = serde_json::from_str(&file.body).unwrap();

        assert_eq!(parsed["counts"].as_object().unwrap().len(), SupportEntity::ALL.len());
        assert_eq!(parsed["counts"]["message"], 2);
        assert_eq!(parsed["counts"]["conversation"], 1);
        assert_eq!(parsed["counts"]["learning_example"], 3);
        assert_eq!(parsed["conversations"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["settings"]["retention_days"], 365);
        assert_eq!(file.count, 1);
    }
}
