//! Scheduled job configuration.
//!
//! Retention enforcement and backups run on fixed triggers. The *policy* for
//! both (retention days, backup cadence) lives in the application settings
//! record; this section only controls whether the triggers fire and how often.
//!
//! # Example
//!
//! ```toml
//! [jobs.retention]
//! enabled = true
//! interval_hours = 24
//!
//! [jobs.backup]
//! enabled = true
//! interval_hours = 1
//! ```

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Background job triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Retention enforcement trigger.
    #[serde(default)]
    pub retention: RetentionJobConfig,

    /// Backup trigger.
    #[serde(default)]
    pub backup: BackupJobConfig,
}

/// Retention enforcement trigger.
///
/// Runs the retention policy (archive, delete archived, prune action log)
/// once per interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionJobConfig {
    /// Whether the trigger fires at all.
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours between runs.
    /// Default: 24 (once per day)
    #[serde(default = "default_retention_interval_hours")]
    pub interval_hours: u64,
}

impl Default for RetentionJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: default_retention_interval_hours(),
        }
    }
}

/// Backup trigger.
///
/// The trigger only *checks* whether a backup is due; the cadence itself comes
/// from the `backup_schedule` setting, so an hourly tick with a daily schedule
/// produces one backup per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupJobConfig {
    /// Whether the trigger fires at all.
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Hours between due-ness checks.
    /// Default: 1
    #[serde(default = "default_backup_interval_hours")]
    pub interval_hours: u64,
}

impl Default for BackupJobConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_hours: default_backup_interval_hours(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_retention_interval_hours() -> u64 {
    24
}

fn default_backup_interval_hours() -> u64 {
    1
}

impl RetentionJobConfig {
    /// Get the interval as a Duration.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_hours * 3600)
    }
}

impl BackupJobConfig {
    /// Get the interval as a Duration.
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_hours * 3600)
    }
}

impl JobsConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.retention.interval_hours == 0 {
            return Err(ConfigError::Validation(
                "jobs.retention.interval_hours must be at least 1".into(),
            ));
        }
        if self.backup.interval_hours == 0 {
            return Err(ConfigError::Validation(
                "jobs.backup.interval_hours must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
