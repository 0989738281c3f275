use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::{
    db::{ActionLogRepo, ConversationRepo, DbError},
    observability::metrics,
    settings::Settings,
};

/// Conversations fetched per archive page.
const ARCHIVE_PAGE_SIZE: u32 = 200;
/// Archived conversations fetched per delete page.
const DELETE_PAGE_SIZE: u32 = 100;
/// Action log entries fetched per prune page.
const AUDIT_PAGE_SIZE: u32 = 250;

/// `now` minus a whole number of days.
///
/// Saturates at the earliest representable instant, which matches nothing.
pub fn cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(TimeDelta::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Counts from one retention run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionReport {
    pub archived_count: u64,
    pub deleted_count: u64,
    pub audit_deleted: u64,
}

impl RetentionReport {
    pub fn total(&self) -> u64 {
        self.archived_count + self.deleted_count + self.audit_deleted
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionStage {
    Archive,
    DeleteArchived,
    PruneAuditLog,
}

impl RetentionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetentionStage::Archive => "archive",
            RetentionStage::DeleteArchived => "delete_archived",
            RetentionStage::PruneAuditLog => "prune_audit_log",
        }
    }
}

impl std::fmt::Display for RetentionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retention run stopped part-way.
///
/// `completed` holds what was done before the failure; those changes are
/// already committed.
#[derive(Debug, Error)]
#[error("retention run aborted during {stage}: {source}")]
pub struct RetentionAbort {
    pub stage: RetentionStage,
    pub completed: RetentionReport,
    #[source]
    pub source: DbError,
}

pub struct RetentionEnforcer {
    conversations: Arc<dyn ConversationRepo>,
    action_logs: Arc<dyn ActionLogRepo>,
}

impl RetentionEnforcer {
    pub fn new(
        conversations: Arc<dyn ConversationRepo>,
        action_logs: Arc<dyn ActionLogRepo>,
    ) -> Self {
        Self {
            conversations,
            action_logs,
        }
    }

    /// Apply the retention policy as of `now`.
    pub async fn enforce(
        &self,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Result<RetentionReport, RetentionAbort> {
        let archive_cutoff = cutoff(now, settings.retention_days);
        let audit_cutoff = cutoff(now, settings.audit_log_retention_days);
        let mut report = RetentionReport::default();

        if settings.auto_archive_enabled {
            report.archived_count = self
                .archive_stale(archive_cutoff, now, &report)
                .await?;
            metrics::record_retention("archived", report.archived_count);
        }

        if settings.delete_archived_data {
            report.deleted_count = self.delete_archived(archive_cutoff, &report).await?;
            metrics::record_retention("deleted", report.deleted_count);
        }

        report.audit_deleted = self.prune_audit_log(audit_cutoff, &report).await?;
        metrics::record_retention("audit_deleted", report.audit_deleted);

        tracing::debug!(
            archive_cutoff = %archive_cutoff,
            audit_cutoff = %audit_cutoff,
            archived = report.archived_count,
            deleted = report.deleted_count,
            audit_deleted = report.audit_deleted,
            "Retention policy applied"
        );

        Ok(report)
    }

    async fn archive_stale(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        report: &RetentionReport,
    ) -> Result<u64, RetentionAbort> {
        let stage = RetentionStage::Archive;
        let mut archived = 0u64;

        loop {
            let page = self
                .conversations
                .list_unarchived_before(cutoff, ARCHIVE_PAGE_SIZE)
                .await
                .map_err(|e| abort(stage, report, archived, e))?;

            for conversation in &page {
                match self.conversations.archive(conversation.id, now).await {
                    Ok(()) => archived += 1,
                    Err(DbError::NotFound) => {
                        tracing::debug!(id = %conversation.id, "Conversation vanished before archiving");
                    }
                    Err(e) => return Err(abort(stage, report, archived, e)),
                }
            }

            if page.len() < ARCHIVE_PAGE_SIZE as usize {
                break;
            }
        }

        Ok(archived)
    }

    async fn delete_archived(
        &self,
        cutoff: DateTime<Utc>,
        report: &RetentionReport,
    ) -> Result<u64, RetentionAbort> {
        let stage = RetentionStage::DeleteArchived;
        let mut deleted = 0u64;

        loop {
            let page = self
                .conversations
                .list_archived_before(cutoff, DELETE_PAGE_SIZE)
                .await
                .map_err(|e| abort(stage, report, deleted, e))?;

            for conversation in &page {
                match self.conversations.delete(conversation.id).await {
                    Ok(()) => deleted += 1,
                    Err(DbError::NotFound) => {
                        tracing::debug!(id = %conversation.id, "Conversation already deleted");
                    }
                    Err(e) => return Err(abort(stage, report, deleted, e)),
                }
            }

            if page.len() < DELETE_PAGE_SIZE as usize {
                break;
            }
        }

        Ok(deleted)
    }

    async fn prune_audit_log(
        &self,
        cutoff: DateTime<Utc>,
        report: &RetentionReport,
    ) -> Result<u64, RetentionAbort> {
        let stage = RetentionStage::PruneAuditLog;
        let mut deleted = 0u64;

        loop {
            let page = self
                .action_logs
                .list_ids_before(cutoff, AUDIT_PAGE_SIZE)
                .await
                .map_err(|e| abort(stage, report, deleted, e))?;

            for id in &page {
                match self.action_logs.delete(*id).await {
                    Ok(()) => deleted += 1,
                    Err(DbError::NotFound) => {}
                    Err(e) => return Err(abort(stage, report, deleted, e)),
                }
            }

            if page.len() < AUDIT_PAGE_SIZE as usize {
                break;
            }
        }

        Ok(deleted)
    }
}

/// Build the abort error, folding the in-progress stage count into the report.
fn abort(
    stage: RetentionStage,
    report: &RetentionReport,
    stage_count: u64,
    source: DbError,
) -> RetentionAbort {
    let mut completed = *report;
    match stage {
        RetentionStage::Archive => completed.archived_count = stage_count,
        RetentionStage::DeleteArchived => completed.deleted_count = stage_count,
        RetentionStage::PruneAuditLog => completed.audit_deleted = stage_count,
    }
    tracing::error!(stage = %stage, error = %source, "Retention run aborted");
    RetentionAbort {
        stage,
        completed,
        source,
    }
}


#[cfg(all(test, feature = "database-sqlite"))]
mod sqlite_tests {
    use chrono::Duration;
    use serde_json::{Map, json};

    use super::*;
    use crate::{
        db::tests::{
            faults::{FaultyActionLogs, FaultyConversations},
            harness::{count_rows, create_test_db, insert_conversation},
        },
        models::{ConversationStatus, CreateActionLogEntry, PerformedVia, SYSTEM_ACTOR},
        settings::resolve,
    };

    async fn log_entry_aged(logs: &Arc<dyn ActionLogRepo>, performed_at: DateTime<Utc>) {
        logs.create(CreateActionLogEntry {
            action: "support.test".into(),
            description: String::new(),
            performed_by: SYSTEM_ACTOR.into(),
            performed_via: PerformedVia::Schedule,
            success: true,
            metadata: json!({}),
            performed_at: Some(performed_at),
        })
        .await
        .unwrap();
    }

    fn settings(value: serde_json::Value) -> Settings {
        match value {
            serde_json::Value::Object(map) => resolve(&map),
            _ => resolve(&Map::new()),
        }
    }

    #[tokio::test]
    async fn test_ninety_day_archive_scenario() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        let id = insert_conversation(&pool, now - Duration::days(100), None).await;

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());
        let report = enforcer
            .enforce(
                &settings(json!({"retention_days": 90, "auto_archive_enabled": true})),
                now,
            )
            .await
            .unwrap();

        assert_eq!(report.archived_count, 1);
        assert_eq!(report.deleted_count, 0);

        let conversation = db.conversations().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(conversation.status, ConversationStatus::Archived);
        assert_eq!(conversation.archived_at, Some(now));
    }

    #[tokio::test]
    async fn test_recent_conversation_untouched() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        let id = insert_conversation(&pool, now - Duration::days(10), None).await;

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());
        let report = enforcer
            .enforce(&settings(json!({"retention_days": 90})), now)
            .await
            .unwrap();

        assert_eq!(report.archived_count, 0);
        let conversation = db.conversations().get_by_id(id).await.unwrap().unwrap();
        assert!(conversation.archived_at.is_none());
    }

    #[tokio::test]
    async fn test_auto_archive_disabled() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        insert_conversation(&pool, now - Duration::days(100), None).await;

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());
        let report = enforcer
            .enforce(
                &settings(json!({"retention_days": 90, "auto_archive_enabled": false})),
                now,
            )
            .await
            .unwrap();

        assert_eq!(report.archived_count, 0);
    }

    #[tokio::test]
    async fn test_archived_deleted_only_when_enabled() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        let id = insert_conversation(
            &pool,
            now - Duration::days(400),
            Some(now - Duration::days(120)),
        )
        .await;

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());

        let report = enforcer
            .enforce(&settings(json!({"retention_days": 90})), now)
            .await
            .unwrap();
        assert_eq!(report.deleted_count, 0);
        assert!(db.conversations().get_by_id(id).await.unwrap().is_some());

        let report = enforcer
            .enforce(
                &settings(json!({"retention_days": 90, "delete_archived_data": true})),
                now,
            )
            .await
            .unwrap();
        assert_eq!(report.deleted_count, 1);
        assert!(db.conversations().get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_freshly_archived_not_deleted_in_same_run() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        insert_conversation(&pool, now - Duration::days(100), None).await;

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());
        let report = enforcer
            .enforce(
                &settings(json!({"retention_days": 90, "delete_archived_data": true})),
                now,
            )
            .await
            .unwrap();

        assert_eq!(report.archived_count, 1);
        assert_eq!(report.deleted_count, 0);
        assert_eq!(count_rows(&pool, "conversations").await, 1);
    }

    #[tokio::test]
    async fn test_archives_across_multiple_pages() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        for i in 0..(ARCHIVE_PAGE_SIZE + 5) {
            let latest = now - Duration::days(100) - Duration::minutes(i.into());
            insert_conversation(&pool, latest, None).await;
        }

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());
        let report = enforcer
            .enforce(&Settings::default(), now + Duration::days(300))
            .await
            .unwrap();

        assert_eq!(report.archived_count, u64::from(ARCHIVE_PAGE_SIZE + 5));
    }

    #[tokio::test]
    async fn test_prunes_audit_log_by_age() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        let logs = db.action_logs();
        for days in [800, 731, 10] {
            log_entry_aged(&logs, now - Duration::days(days)).await;
        }

        let enforcer = RetentionEnforcer::new(db.conversations(), logs);
        let report = enforcer.enforce(&Settings::default(), now).await.unwrap();

        assert_eq!(report.audit_deleted, 2);
        assert_eq!(count_rows(&pool, "action_log").await, 1);
    }

    #[tokio::test]
    async fn test_deletes_archived_across_multiple_pages() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        let count = DELETE_PAGE_SIZE + 7;
        for _ in 0..count {
            insert_conversation(
                &pool,
                now - Duration::days(500),
                Some(now - Duration::days(400)),
            )
            .await;
        }

        let enforcer = RetentionEnforcer::new(db.conversations(), db.action_logs());
        let report = enforcer
            .enforce(&settings(json!({"delete_archived_data": true})), now)
            .await
            .unwrap();

        assert_eq!(report.deleted_count, u64::from(count));
        assert_eq!(count_rows(&pool, "conversations").await, 0);
    }

    #[tokio::test]
    async fn test_prunes_audit_log_across_multiple_pages() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        let logs = db.action_logs();
        let count = AUDIT_PAGE_SIZE + 3;
        for i in 0..count {
            log_entry_aged(&logs, now - Duration::days(800) - Duration::minutes(i.into())).await;
        }
        log_entry_aged(&logs, now - Duration::days(1)).await;

        let enforcer = RetentionEnforcer::new(db.conversations(), logs);
        let report = enforcer.enforce(&Settings::default(), now).await.unwrap();

        assert_eq!(report.audit_deleted, u64::from(count));
        assert_eq!(count_rows(&pool, "action_log").await, 1);
    }

    #[tokio::test]
    async fn test_archive_error_stops_the_run() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        for _ in 0..5 {
            insert_conversation(&pool, now - Duration::days(400), None).await;
        }
        let logs = db.action_logs();
        log_entry_aged(&logs, now - Duration::days(800)).await;

        let enforcer = RetentionEnforcer::new(
            FaultyConversations::failing_archive(db.conversations(), 3),
            logs,
        );
        let abort = enforcer
            .enforce(&Settings::default(), now)
            .await
            .unwrap_err();

        assert_eq!(abort.stage, RetentionStage::Archive);
        assert_eq!(
            abort.completed,
            RetentionReport {
                archived_count: 2,
                deleted_count: 0,
                audit_deleted: 0,
            }
        );
        // Later stages never ran.
        assert_eq!(count_rows(&pool, "action_log").await, 1);
    }

    #[tokio::test]
    async fn test_delete_error_keeps_earlier_stage_counts() {
        let (pool, db) = create_test_db().await;
        let now = Utc::now();
        insert_conversation(&pool, now - Duration::days(400), None).await;
        for _ in 0..3 {
            insert_conversation(
                &pool,
                now - Duration::days(500),
                Some(now - Duration::days(400)),
            )
            .await;
        }

        let enforcer = RetentionEnforcer::new(
            FaultyConversations::failing_delete(db.conversations(), 2),
            db.action_logs(),
        );
        let abort = enforcer
            .enforce(&settings(json!({"delete_archived_data": true})), now)
            .await
            .unwrap_err();

        assert_eq!(abort.stage, RetentionStage::DeleteArchived);
        assert_eq!(abort.completed.archived_count, 1);
        assert_eq!(abort.completed.deleted_count, 1);
        assert_eq!(count_rows(&pool, "conversations").await, 3);
    }

    #[tokio::test]
    async fn test_prune_error_reports_stage() {
        let (_, db) = create_test_db().await;
        let now = Utc::now();
        let logs = db.action_logs();
        for days in [900, 800] {
            log_entry_aged(&logs, now - Duration::days(days)).await;
        }

        let enforcer = RetentionEnforcer::new(
            db.conversations(),
            FaultyActionLogs::failing_delete(logs, 2),
        );
        let abort = enforcer
            .enforce(&Settings::default(), now)
            .await
            .unwrap_err();

        assert_eq!(abort.stage, RetentionStage::PruneAuditLog);
        assert_eq!(abort.completed.audit_deleted, 1);
        assert!(abort.to_string().contains("prune_audit_log"));
    }
}
