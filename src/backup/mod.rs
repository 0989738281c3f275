//! Backup due-ness.
//!
//! Deciding whether a backup should run is pure: it depends only on whether
//! the run was forced, when the last backup happened, the configured cadence,
//! and the current time. Recording the run is the backup service's job.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::settings::BackupSchedule;

/// How a backup run was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupTrigger {
    /// Periodic check; runs only when due.
    Scheduled,
    /// Manual run by an administrator; always due.
    Forced,
}

impl BackupTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupTrigger::Scheduled => "scheduled",
            BackupTrigger::Forced => "forced",
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(self, BackupTrigger::Forced)
    }
}

impl std::fmt::Display for BackupTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a backup attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackupOutcome {
    /// Not due (or disabled); nothing was changed.
    Skipped {
        #[serde(rename = "nextDueAt", skip_serializing_if = "Option::is_none")]
        next_due_at: Option<DateTime<Utc>>,
    },
    /// A backup was recorded at this instant.
    Ran {
        #[serde(rename = "ranAt")]
        ran_at: DateTime<Utc>,
    },
}

impl BackupOutcome {
    pub fn ran(&self) -> bool {
        matches!(self, BackupOutcome::Ran { .. })
    }
}

/// Whether a backup should run now.
///
/// Due when forced, when no backup has ever run, or when at least one
/// schedule interval has elapsed since the last one. A last-backup time in
/// the future (clock skew) is not due until the interval elapses from it.
pub fn is_due(
    force: bool,
    last_backup_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    schedule: BackupSchedule,
) -> bool {
    if force {
        return true;
    }
    match last_backup_at {
        None => true,
        Some(last) => next_due_at(last, schedule).is_none_or(|due| now >= due),
    }
}

/// When the next scheduled backup becomes due. `None` on overflow.
pub fn next_due_at(last_backup_at: DateTime<Utc>, schedule: BackupSchedule) -> Option<DateTime<Utc>> {
    let interval = chrono::TimeDelta::from_std(schedule.interval()).ok()?;
    last_backup_at.checked_add_signed(interval)
}
