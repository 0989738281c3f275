//! Governance operations.
//!
//! Each service gates entry with the [`AccessGuard`] where an administrator
//! is required, re-resolves settings from the configuration record, takes the
//! single-flight permit for destructive work, and records an action log entry
//! once the operation has completed.

mod action_log;
pub mod audit_gate;
mod backup;
mod error;
mod exports;
mod hard_reset;
mod learning;
mod locks;
mod retention;
mod settings;

use std::sync::Arc;

pub use action_log::{ActionLogService, ActionRecord, actions};
pub use audit_gate::{AuditCategory, should_record};
pub use backup::BackupService;
pub use error::{GovernanceError, GovernanceResult};
pub use exports::{
    BackupSnapshot, ExportFile, ExportFormat, ExportService, SNAPSHOT_CONVERSATION_LIMIT,
    audit_logs_csv, audit_logs_json,
};
pub use hard_reset::{HardResetReport, HardResetService};
pub use learning::{LearningResetReport, LearningResetService};
pub use locks::{Operation, OperationLocks, OperationPermit};
pub use retention::RetentionService;
pub use settings::{SettingsService, SettingsView};

use crate::{auth::AccessGuard, config::AuthConfig, db::DbPool};

/// Container for all governance services
#[derive(Clone)]
pub struct Services {
    pub guard: Arc<AccessGuard>,
    pub locks: OperationLocks,
    pub action_log: ActionLogService,
    pub settings: SettingsService,
    pub retention: RetentionService,
    pub backup: BackupService,
    pub hard_reset: HardResetService,
    pub learning: LearningResetService,
    pub exports: ExportService,
}

impl Services {
    pub fn new(db: Arc<DbPool>, auth: &AuthConfig) -> Self {
        let guard = Arc::new(AccessGuard::new(db.users(), auth));
        let locks = OperationLocks::new();
        let action_log = ActionLogService::new(db.clone());
        let settings = SettingsService::new(db.clone(), guard.clone(), action_log.clone());

        Self {
            retention: RetentionService::new(
                db.clone(),
                settings.clone(),
                action_log.clone(),
                locks.clone(),
            ),
            backup: BackupService::new(
                db.clone(),
                guard.clone(),
                settings.clone(),
                action_log.clone(),
                locks.clone(),
            ),
            hard_reset: HardResetService::new(
                db.clone(),
                guard.clone(),
                settings.clone(),
                action_log.clone(),
                locks.clone(),
            ),
            learning: LearningResetService::new(
                db.clone(),
                guard.clone(),
                settings.clone(),
                action_log.clone(),
                locks.clone(),
            ),
            exports: ExportService::new(db, guard.clone(), settings.clone(), action_log.clone()),
            guard,
            locks,
            action_log,
            settings,
        }
    }
}
