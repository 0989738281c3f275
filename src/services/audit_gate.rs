//! Per-category audit recording decisions.

use serde::Serialize;

use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Auth,
    EmailAccess,
    ConfigChange,
    Export,
}

impl AuditCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditCategory::Auth => "auth",
            AuditCategory::EmailAccess => "email_access",
            AuditCategory::ConfigChange => "config_change",
            AuditCategory::Export => "export",
        }
    }

    pub fn parse(category: &str) -> Option<Self> {
        match category {
            "auth" => Some(AuditCategory::Auth),
            "email_access" => Some(AuditCategory::EmailAccess),
            "config_change" => Some(AuditCategory::ConfigChange),
            "export" => Some(AuditCategory::Export),
            _ => None,
        }
    }

    /// Whether this category is recorded under `settings`.
    pub fn is_enabled(&self, settings: &Settings) -> bool {
        match self {
            AuditCategory::Auth => settings.audit_auth,
            AuditCategory::EmailAccess => settings.audit_email_access,
            AuditCategory::ConfigChange => settings.audit_config_change,
            AuditCategory::Export => settings.audit_export,
        }
    }
}

impl std::fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an action in `category` should be recorded.
///
/// Unrecognized categories are recorded; only an explicitly disabled known
/// category suppresses the entry.
pub fn should_record(settings: &Settings, category: &str) -> bool {
    AuditCategory::parse(category).is_none_or(|c| c.is_enabled(settings))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("auth")]
    #[case("email_access")]
    #[case("config_change")]
    #[case("export")]
    fn test_enabled_by_default(#[case] category: &str) {
        assert!(should_record(&Settings::default(), category));
    }

    #[test]
    fn test_disabled_category() {
        let settings = Settings {
            audit_export: false,
            ..Default::default()
        };
        assert!(!should_record(&settings, "export"));
        assert!(should_record(&settings, "auth"));
    }

    #[test]
    fn test_unknown_category_fails_open() {
        let settings = Settings {
            audit_auth: false,
            audit_email_access: false,
            audit_config_change: false,
            audit_export: false,
            ..Default::default()
        };
        assert!(should_record(&settings, "billing"));
        assert!(should_record(&settings, ""));
    }

    #[test]
    fn test_parse_round_trip() {
        for category in [
            AuditCategory::Auth,
            AuditCategory::EmailAccess,
            AuditCategory::ConfigChange,
            AuditCategory::Export,
        ] {
            assert_eq!(AuditCategory::parse(category.as_str()), Some(category));
        }
    }
}
