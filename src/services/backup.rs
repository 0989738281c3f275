use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{
    GovernanceError, GovernanceResult, Operation, OperationLocks,
    action_log::{ActionLogService, ActionRecord, actions},
    audit_gate::AuditCategory,
    settings::SettingsService,
};
use crate::{
    auth::{AccessGuard, Session},
    backup::{self, BackupOutcome, BackupTrigger},
    db::DbPool,
    models::PerformedVia,
    observability::metrics,
};

/// Records backup runs when they are due or forced.
#[derive(Clone)]
pub struct BackupService {
    db: Arc<DbPool>,
    guard: Arc<AccessGuard>,
    settings: SettingsService,
    action_log: ActionLogService,
    locks: OperationLocks,
}

impl BackupService {
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

    /// Periodic check. Runs only when due; no identity required.
    pub async fn run_scheduled(&self) -> GovernanceResult<BackupOutcome> {
        self.execute(BackupTrigger::Scheduled, None, PerformedVia::Schedule, Utc::now())
            .await
    }

    /// Manual trigger by an administrator.
    ///
    /// With `force` the backup runs regardless of cadence; without it the
    /// usual due check applies.
    pub async fn run_manual(&self, session: &Session, force: bool) -> GovernanceResult<BackupOutcome> {
        let actor = self.guard.require_admin(session).await?;
        let trigger = if force {
            BackupTrigger::Forced
        } else {
            BackupTrigger::Scheduled
        };
        self.execute(trigger, Some(&actor), session.via, Utc::now())
            .await
    }

    async fn execute(
        &self,
        trigger: BackupTrigger,
        actor: Option<&str>,
        via: PerformedVia,
        now: DateTime<Utc>,
    ) -> GovernanceResult<BackupOutcome> {
        let _permit = self.locks.acquire(Operation::Backup)?;
        let view = self.settings.load().await?;
        let settings = &view.settings;

        if !settings.backup_enabled {
            if trigger.is_forced() {
                return Err(GovernanceError::PolicyViolation(
                    "backups are disabled".to_string(),
                ));
            }
            tracing::debug!("Backups disabled, skipping scheduled run");
            return Ok(BackupOutcome::Skipped { next_due_at: None });
        }

        let schedule = settings.backup_cadence();
        if !backup::is_due(trigger.is_forced(), view.last_backup_at, now, schedule) {
            let next_due_at = view
                .last_backup_at
                .and_then(|last| backup::next_due_at(last, schedule));
            tracing::debug!(
                schedule = schedule.as_str(),
                next_due_at = ?next_due_at,
                "Backup not due"
            );
            return Ok(BackupOutcome::Skipped { next_due_at });
        }

        self.db.app_configuration().set_last_backup_at(now).await?;
        metrics::record_backup(trigger.as_str());

        tracing::info!(
            trigger = %trigger,
            schedule = schedule.as_str(),
            ran_at = %now,
            "Backup recorded"
        );

        self.action_log
            .record(
                settings,
                ActionRecord {
                    action: actions::BACKUP,
                    category: AuditCategory::Export,
                    description: format!("{} backup ({})", trigger, schedule.as_str()),
                    actor,
                    via,
                    success: true,
                    metadata: json!({
                        "trigger": trigger.as_str(),
                        "schedule": schedule.as_str(),
                        "backup_retention_days": settings.backup_retention_days,
                    }),
                },
            )
            .await;

        Ok(BackupOutcome::Ran { ran_at: now })
    }
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::services::testing::{admin_session, agent_session, fixture};

    #[tokio::test]
    async fn test_first_scheduled_run_is_due() {
        let (_, db, services) = fixture().await;

        let outcome = services.backup.run_scheduled().await.unwrap();
        assert!(outcome.ran());

        let config = db.app_configuration().get_or_init().await.unwrap();
        assert!(config.last_backup_at.is_some());

        let entries = db.action_logs().list_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, actions::BACKUP);
        assert_eq!(entries[0].metadata["trigger"], "scheduled");
        assert_eq!(entries[0].metadata["schedule"], "daily");
        assert_eq!(entries[0].metadata["backup_retention_days"], 30);
    }

    #[tokio::test]
    async fn test_not_due_right_after_run() {
        let (_, _, services) = fixture().await;
        let now = Utc::now();

        let first = services
            .backup
            .execute(BackupTrigger::Scheduled, None, PerformedVia::Schedule, now)
            .await
            .unwrap();
        assert!(first.ran());

        let second = services
            .backup
            .execute(BackupTrigger::Scheduled, None, PerformedVia::Schedule, now)
            .await
            .unwrap();
        assert_eq!(
            second,
            BackupOutcome::Skipped {
                next_due_at: Some(now + Duration::hours(24))
            }
        );
    }

    #[tokio::test]
    async fn test_forced_runs_even_when_not_due() {
        let (_, db, services) = fixture().await;
        services.backup.run_scheduled().await.unwrap();

        let outcome = services
            .backup
            .run_manual(&admin_session(), true)
            .await
            .unwrap();
        assert!(outcome.ran());

        let entries = db.action_logs().list_recent(10).await.unwrap();
        assert_eq!(entries[0].metadata["trigger"], "forced");
        assert_eq!(entries[0].performed_by, "admin_1");
    }

    #[tokio::test]
    async fn test_forced_requires_admin() {
        let (_, db, services) = fixture().await;

        let err = services
            .backup
            .run_manual(&agent_session(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::Auth(_)));

        let config = db.app_configuration().get_or_init().await.unwrap();
        assert!(config.last_backup_at.is_none());
    }

    #[tokio::test]
    async fn test_disabled_backups() {
        let (_, db, services) = fixture().await;
        db.app_configuration()
            .update_settings(json!({"backup_enabled": false}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let scheduled = services.backup.run_scheduled().await.unwrap();
        assert_eq!(scheduled, BackupOutcome::Skipped { next_due_at: None });

        let forced = services.backup.run_manual(&admin_session(), true).await;
        assert!(matches!(forced, Err(GovernanceError::PolicyViolation(_))));
    }

    #[tokio::test]
    async fn test_disabled_export_audit_still_runs() {
        let (_, db, services) = fixture().await;
        db.app_configuration()
            .update_settings(json!({"audit_export": false}).as_object().cloned().unwrap())
            .await
            .unwrap();

        assert!(services.backup.run_scheduled().await.unwrap().ran());
        assert!(db.action_logs().list_recent(10).await.unwrap().is_empty());
    }
}
