use std::{collections::BTreeMap, sync::Arc};

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
    db::{DbError, DbPool, SupportDataRepo},
    models::SupportEntity,
    purge::{EntityPurgeSource, PaginatedPurger, PurgeStats},
    settings::Settings,
};

/// Result of a whole-tenant purge.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HardResetReport {
    pub deleted: BTreeMap<SupportEntity, PurgeStats>,
    /// Whether any row of each kind is still present afterwards
    pub remaining_any: BTreeMap<SupportEntity, bool>,
}

impl HardResetReport {
    pub fn is_clean(&self) -> bool {
        !self.remaining_any.values().any(|&remaining| remaining)
    }

    pub fn total_deleted(&self) -> u64 {
        self.deleted.values().map(|s| s.deleted).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.deleted.values().map(|s| s.failed).sum()
    }
}

/// Irreversibly deletes all support data.
///
/// Kinds are purged children first so no step searches for children of an
/// already-removed parent. Per-row failures are tallied, not surfaced. The
/// action log and the configuration record survive.
///
/// Once purging has begun every outcome is written to the action log,
/// including runs that stop on a storage error.
#[derive(Clone)]
pub struct HardResetService {
    db: Arc<DbPool>,
    support_data: Arc<dyn SupportDataRepo>,
    guard: Arc<AccessGuard>,
    settings: SettingsService,
    action_log: ActionLogService,
    locks: OperationLocks,
    purger: PaginatedPurger,
}

impl HardResetService {
    pub fn new(
        db: Arc<DbPool>,
        guard: Arc<AccessGuard>,
        settings: SettingsService,
        action_log: ActionLogService,
        locks: OperationLocks,
    ) -> Self {
        Self {
            support_data: db.support_data(),
            db,
            guard,
            settings,
            action_log,
            locks,
            purger: PaginatedPurger::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_purger(mut self, purger: PaginatedPurger) -> Self {
        self.purger = purger;
        self
    }

    #[cfg(test)]
    pub(crate) fn with_support_data(mut self, support_data: Arc<dyn SupportDataRepo>) -> Self {
        self.support_data = support_data;
        self
    }

    pub async fn run(&self, session: &Session) -> GovernanceResult<HardResetReport> {
        let actor = self.guard.require_admin(session).await?;
        let _permit = self.locks.acquire(Operation::HardReset)?;
        let settings = self.settings.load().await?.settings;

        tracing::warn!(user_id = %actor, via = %session.via, "Hard reset of support data started");

        let mut report = HardResetReport::default();

        for kind in SupportEntity::HARD_RESET_ORDER {
            let source = EntityPurgeSource::new(Arc::clone(&self.support_data), kind);
            match self.purger.purge(kind.as_str(), &source).await {
                Ok(stats) => {
                    report.deleted.insert(kind, stats);
                }
                Err(interrupted) => {
                    report.deleted.insert(kind, interrupted.stats);
                    return Err(self
                        .stopped(&settings, &actor, session, &report, kind.as_str(), interrupted.source)
                        .await);
                }
            }
        }

        // The data is gone whether or not the checks below succeed.
        if let Err(e) = self.db.app_configuration().set_last_sync_at(None).await {
            return Err(self
                .stopped(&settings, &actor, session, &report, "sync_cursor", e)
                .await);
        }

        for kind in SupportEntity::HARD_RESET_ORDER {
            match self.support_data.exists_any(kind).await {
                Ok(remaining) => {
                    report.remaining_any.insert(kind, remaining);
                }
                Err(e) => {
                    return Err(self
                        .stopped(&settings, &actor, session, &report, "verify", e)
                        .await);
                }
            }
        }

        tracing::warn!(
            user_id = %actor,
            deleted = report.total_deleted(),
            failed = report.total_failed(),
            clean = report.is_clean(),
            "Hard reset of support data finished"
        );

        self.action_log
            .record(
                &settings,
                ActionRecord {
                    action: actions::HARD_RESET,
                    category: AuditCategory::ConfigChange,
                    description: format!(
                        "Hard reset deleted {} rows ({} failed)",
                        report.total_deleted(),
                        report.total_failed()
                    ),
                    actor: Some(&actor),
                    via: session.via,
                    success: report.is_clean(),
                    metadata: json!({
                        "deleted": report.deleted,
                        "remainingAny": report.remaining_any,
                    }),
                },
            )
            .await;

        Ok(report)
    }

    /// Record a run that stopped on a storage error after purging began.
    async fn stopped(
        &self,
        settings: &Settings,
        actor: &str,
        session: &Session,
        report: &HardResetReport,
        stopped_at: &str,
        error: DbError,
    ) -> GovernanceError {
        tracing::error!(
            stopped_at,
            deleted = report.total_deleted(),
            error = %error,
            "Hard reset stopped"
        );
        self.action_log
            .record(
                settings,
                ActionRecord {
                    action: actions::HARD_RESET,
                    category: AuditCategory::ConfigChange,
                    description: format!(
                        "Hard reset stopped at {} after deleting {} rows",
                        stopped_at,
                        report.total_deleted()
                    ),
                    actor: Some(actor),
                    via: session.via,
                    success: false,
                    metadata: json!({
                        "deleted": report.deleted,
                        "remainingAny": report.remaining_any,
                        "stoppedAt": stopped_at,
                        "error": error.to_string(),
                    }),
                },
            )
            .await;
        GovernanceError::Database(error)
    }
}
