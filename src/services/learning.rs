use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use super::{
    GovernanceError, GovernanceResult, Operation, OperationLocks,
    action_log::{ActionLogService, ActionRecord, actions},
    audit_gate::AuditCategory,
    settings::SettingsService,
};
use crate::{
    auth::{AccessGuard, Session},
    db::DbPool,
    models::SupportEntity,
    purge::{EntityPurgeSource, PaginatedPurger, PurgeStats},
};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningResetReport {
    pub deleted: PurgeStats,
    pub remaining_any: bool,
}

/// Forgets the examples the triage assistant has learned from.
#[derive(Clone)]
pub struct LearningResetService {
    db: Arc<DbPool>,
    guard: Arc<AccessGuard>,
    settings: SettingsService,
    action_log: ActionLogService,
    locks: OperationLocks,
}

impl LearningResetService {
    pub fn new(
        db: Arc<DbPool>,
        guard: Arc<AccessGuard>,
        settings: SettingsService,
        action_log: ActionLogService,
        locks: OperationLocks,
    ) -> Self {
        Self {
            db,
            guard,
            settings,
            action_log,
            locks,
        }
    }

    pub async fn run(&self, session: &Session) -> GovernanceResult<LearningResetReport> {
        let actor = self.guard.require_admin(session).await?;
        let _permit = self.locks.acquire(Operation::LearningReset)?;
        let settings = self.settings.load().await?.settings;

        let kind = SupportEntity::LearningExample;
        let source = EntityPurgeSource::new(self.db.support_data(), kind);
        let outcome = match PaginatedPurger::new().purge(kind.as_str(), &source).await {
            Ok(deleted) => self
                .db
                .support_data()
                .exists_any(kind)
                .await
                .map(|remaining_any| LearningResetReport {
                    deleted,
                    remaining_any,
                })
                .map_err(|e| (deleted, e)),
            Err(interrupted) => Err((interrupted.stats, interrupted.source)),
        };

        let (record, result) = match outcome {
            Ok(report) => {
                tracing::info!(
                    user_id = %actor,
                    deleted = report.deleted.deleted,
                    failed = report.deleted.failed,
                    remaining_any = report.remaining_any,
                    "Support learning reset"
                );
                (
                    ActionRecord {
                        action: actions::LEARNING_RESET,
                        category: AuditCategory::ConfigChange,
                        description: format!("Reset {} learned examples", report.deleted.deleted),
                        actor: Some(&actor),
                        via: session.via,
                        success: !report.remaining_any,
                        metadata: json!({
                            "deleted": report.deleted,
                            "remainingAny": report.remaining_any,
                        }),
                    },
                    Ok(report),
                )
            }
            Err((deleted, e)) => {
                tracing::error!(
                    user_id = %actor,
                    deleted = deleted.deleted,
                    error = %e,
                    "Support learning reset stopped"
                );
                (
                    ActionRecord {
                        action: actions::LEARNING_RESET,
                        category: AuditCategory::ConfigChange,
                        description: format!(
                            "Learning reset stopped after {} learned examples",
                            deleted.deleted
                        ),
                        actor: Some(&actor),
                        via: session.via,
                        success: false,
                        metadata: json!({ "deleted": deleted, "error": e.to_string() }),
                    },
                    Err(GovernanceError::Database(e)),
                )
            }
        };

        self.action_log.record(&settings, record).await;
        result
    }
}
