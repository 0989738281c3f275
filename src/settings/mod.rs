//! Typed policy settings resolved from the application configuration record.
//!
//! The configuration record stores settings as an untyped JSON object that
//! admins edit freely. [`resolve`] turns it into a [`Settings`] value on every
//! invocation: each known key is coerced to its type, and anything missing or
//! unusable falls back to the documented default. Resolution never fails.
//!
//! | key | type | default |
//! |---|---|---|
//! | `retention_days` | days | 365 |
//! | `audit_log_retention_days` | days | 730 |
//! | `auto_archive_enabled` | bool | true |
//! | `delete_archived_data` | bool | false |
//! | `backup_enabled` | bool | true |
//! | `backup_schedule` | string | `daily` |
//! | `backup_retention_days` | days | 30 |
//! | `allow_data_export` | bool | true |
//! | `audit_auth` | bool | true |
//! | `audit_email_access` | bool | true |
//! | `audit_config_change` | bool | true |
//! | `audit_export` | bool | true |

mod coerce;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use self::coerce::{coerce_bool, coerce_days, coerce_string};

/// Every settings key, as stored in the configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    RetentionDays,
    AuditLogRetentionDays,
    AutoArchiveEnabled,
    DeleteArchivedData,
    BackupEnabled,
    BackupSchedule,
    BackupRetentionDays,
    AllowDataExport,
    AuditAuth,
    AuditEmailAccess,
    AuditConfigChange,
    AuditExport,
}

impl SettingKey {
    pub const ALL: [SettingKey; 12] = [
        SettingKey::RetentionDays,
        SettingKey::AuditLogRetentionDays,
        SettingKey::AutoArchiveEnabled,
        SettingKey::DeleteArchivedData,
        SettingKey::BackupEnabled,
        SettingKey::BackupSchedule,
        SettingKey::BackupRetentionDays,
        SettingKey::AllowDataExport,
        SettingKey::AuditAuth,
        SettingKey::AuditEmailAccess,
        SettingKey::AuditConfigChange,
        SettingKey::AuditExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::RetentionDays => "retention_days",
            SettingKey::AuditLogRetentionDays => "audit_log_retention_days",
            SettingKey::AutoArchiveEnabled => "auto_archive_enabled",
            SettingKey::DeleteArchivedData => "delete_archived_data",
            SettingKey::BackupEnabled => "backup_enabled",
            SettingKey::BackupSchedule => "backup_schedule",
            SettingKey::BackupRetentionDays => "backup_retention_days",
            SettingKey::AllowDataExport => "allow_data_export",
            SettingKey::AuditAuth => "audit_auth",
            SettingKey::AuditEmailAccess => "audit_email_access",
            SettingKey::AuditConfigChange => "audit_config_change",
            SettingKey::AuditExport => "audit_export",
        }
    }

    pub fn parse(key: &str) -> Option<SettingKey> {
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backup cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupSchedule {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl BackupSchedule {
    /// Map a stored schedule name to a cadence. Unrecognized names mean daily.
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hourly" => BackupSchedule::Hourly,
            "weekly" => BackupSchedule::Weekly,
            "monthly" => BackupSchedule::Monthly,
            _ => BackupSchedule::Daily,
        }
    }

    /// Minimum time between two scheduled backups.
    pub fn interval(&self) -> Duration {
        const HOUR: u64 = 3600;
        match self {
            BackupSchedule::Hourly => Duration::from_secs(HOUR),
            BackupSchedule::Daily => Duration::from_secs(24 * HOUR),
            BackupSchedule::Weekly => Duration::from_secs(7 * 24 * HOUR),
            BackupSchedule::Monthly => Duration::from_secs(30 * 24 * HOUR),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackupSchedule::Hourly => "hourly",
            BackupSchedule::Daily => "daily",
            BackupSchedule::Weekly => "weekly",
            BackupSchedule::Monthly => "monthly",
        }
    }
}

/// Resolved policy settings.
///
/// Never persisted; always derived from the raw record via [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Days since the latest message before a conversation is archived, and
    /// days since archival before an archived conversation is deleted.
    pub retention_days: u32,
    /// Days to keep action log entries.
    pub audit_log_retention_days: u32,
    pub auto_archive_enabled: bool,
    pub delete_archived_data: bool,
    pub backup_enabled: bool,
    /// Raw schedule name; see [`Settings::backup_cadence`].
    pub backup_schedule: String,
    pub backup_retention_days: u32,
    pub allow_data_export: bool,
    pub audit_auth: bool,
    pub audit_email_access: bool,
    pub audit_config_change: bool,
    pub audit_export: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retention_days: 365,
            audit_log_retention_days: 730,
            auto_archive_enabled: true,
            delete_archived_data: false,
            backup_enabled: true,
            backup_schedule: "daily".to_string(),
            backup_retention_days: 30,
            allow_data_export: true,
            audit_auth: true,
            audit_email_access: true,
            audit_config_change: true,
            audit_export: true,
        }
    }
}

impl Settings {
    pub fn backup_cadence(&self) -> BackupSchedule {
        BackupSchedule::from_setting(&self.backup_schedule)
    }

    /// Render the resolved settings back into the raw record shape.
    pub fn to_raw(&self) -> Map<String, JsonValue> {
        let mut raw = Map::new();
        let mut put = |key: SettingKey, value: JsonValue| {
            raw.insert(key.as_str().to_string(), value);
        };
        put(SettingKey::RetentionDays, self.retention_days.into());
        put(
            SettingKey::AuditLogRetentionDays,
            self.audit_log_retention_days.into(),
        );
        put(SettingKey::AutoArchiveEnabled, self.auto_archive_enabled.into());
        put(SettingKey::DeleteArchivedData, self.delete_archived_data.into());
        put(SettingKey::BackupEnabled, self.backup_enabled.into());
        put(
            SettingKey::BackupSchedule,
            self.backup_schedule.clone().into(),
        );
        put(
            SettingKey::BackupRetentionDays,
            self.backup_retention_days.into(),
        );
        put(SettingKey::AllowDataExport, self.allow_data_export.into());
        put(SettingKey::AuditAuth, self.audit_auth.into());
        put(SettingKey::AuditEmailAccess, self.audit_email_access.into());
        put(SettingKey::AuditConfigChange, self.audit_config_change.into());
        put(SettingKey::AuditExport, self.audit_export.into());
        raw
    }
}

/// Resolve typed settings from a raw configuration record.
///
/// Pure and total: unknown keys are ignored, `null` counts as absent, and a
/// value that cannot be coerced falls back to the key's default.
pub fn resolve(raw: &Map<String, JsonValue>) -> Settings {
    let defaults = Settings::default();
    let value = |key: SettingKey| raw.get(key.as_str()).filter(|v| !v.is_null());

    let days = |key: SettingKey, default: u32| value(key).and_then(coerce_days).unwrap_or(default);
    let flag = |key: SettingKey, default: bool| value(key).and_then(coerce_bool).unwrap_or(default);

    Settings {
        retention_days: days(SettingKey::RetentionDays, defaults.retention_days),
        audit_log_retention_days: days(
            SettingKey::AuditLogRetentionDays,
            defaults.audit_log_retention_days,
        ),
        auto_archive_enabled: flag(
            SettingKey::AutoArchiveEnabled,
            defaults.auto_archive_enabled,
        ),
        delete_archived_data: flag(
            SettingKey::DeleteArchivedData,
            defaults.delete_archived_data,
        ),
        backup_enabled: flag(SettingKey::BackupEnabled, defaults.backup_enabled),
        backup_schedule: value(SettingKey::BackupSchedule)
            .and_then(coerce_string)
            .unwrap_or(defaults.backup_schedule),
        backup_retention_days: days(
            SettingKey::BackupRetentionDays,
            defaults.backup_retention_days,
        ),
        allow_data_export: flag(SettingKey::AllowDataExport, defaults.allow_data_export),
        audit_auth: flag(SettingKey::AuditAuth, defaults.audit_auth),
        audit_email_access: flag(SettingKey::AuditEmailAccess, defaults.audit_email_access),
        audit_config_change: flag(SettingKey::AuditConfigChange, defaults.audit_config_change),
        audit_export: flag(SettingKey::AuditExport, defaults.audit_export),
    }
}
