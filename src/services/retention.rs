use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use super::{
    GovernanceResult, Operation, OperationLocks,
    action_log::{ActionLogService, ActionRecord, actions},
    audit_gate::AuditCategory,
    settings::SettingsService,
};
use crate::{
    db::{ActionLogRepo, ConversationRepo, DbPool},
    models::PerformedVia,
    retention::{RetentionEnforcer, RetentionReport},
};

/// Runs the retention policy with the settings currently in force.
#[derive(Clone)]
pub struct RetentionService {
    conversations: Arc<dyn ConversationRepo>,
    action_logs: Arc<dyn ActionLogRepo>,
    settings: SettingsService,
    action_log: ActionLogService,
    locks: OperationLocks,
}

impl RetentionService {
    pub fn new(
        db: Arc<DbPool>,
        settings: SettingsService,
        action_log: ActionLogService,
        locks: OperationLocks,
    ) -> Self {
        Self {
            conversations: db.conversations(),
            action_logs: db.action_logs(),
            settings,
            action_log,
            locks,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_conversations(mut self, conversations: Arc<dyn ConversationRepo>) -> Self {
        self.conversations = conversations;
        self
    }

    /// Archive stale conversations, delete expired archives, and prune the
    /// action log.
    ///
    /// Fails loudly: the first unexpected row error stops the run and is
    /// returned, with the work done so far recorded in the action log.
    pub async fn enforce_policy(&self, via: PerformedVia) -> GovernanceResult<RetentionReport> {
        let _permit = self.locks.acquire(Operation::Retention)?;
        let settings = self.settings.load().await?.settings;
        let enforcer =
            RetentionEnforcer::new(Arc::clone(&self.conversations), Arc::clone(&self.action_logs));

        let result = enforcer.enforce(&settings, Utc::now()).await;

        let (report, success, error) = match &result {
            Ok(report) => (*report, true, None),
            Err(abort) => (abort.completed, false, Some(abort.to_string())),
        };

        match &result {
            Ok(report) => tracing::info!(
                archived = report.archived_count,
                deleted = report.deleted_count,
                audit_deleted = report.audit_deleted,
                "Retention policy enforced"
            ),
            Err(abort) => tracing::error!(
                stage = %abort.stage,
                archived = report.archived_count,
                deleted = report.deleted_count,
                audit_deleted = report.audit_deleted,
                error = %abort.source,
                "Retention run aborted"
            ),
        }

        self.action_log
            .record(
                &settings,
                ActionRecord {
                    action: actions::RETENTION,
                    category: AuditCategory::ConfigChange,
                    description: format!(
                        "Retention: archived {}, deleted {}, pruned {} log entries",
                        report.archived_count, report.deleted_count, report.audit_deleted
                    ),
                    actor: None,
                    via,
                    success,
                    metadata: json!({
                        "archivedCount": report.archived_count,
                        "deletedCount": report.deleted_count,
                        "auditDeleted": report.audit_deleted,
                        "retentionDays": settings.retention_days,
                        "auditLogRetentionDays": settings.audit_log_retention_days,
                        "error": error,
                    }),
                },
            )
            .await;

        Ok(result?)
    }
}
