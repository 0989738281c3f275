use http::HeaderName;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Admin identity configuration.
///
/// Identity is asserted by a trusted front proxy through a single header whose
/// value is either a bare user id (`u_123`) or a linked-record reference
/// (`{"id": "u_123"}`). Roles are always looked up from the user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Header carrying the caller identity.
    /// Default: `x-steward-user`
    #[serde(default = "default_identity_header")]
    pub identity_header: String,

    /// Role keys that grant admin access. Matching is case-insensitive.
    /// Default: `["admin"]`
    #[serde(default = "default_admin_role_keys")]
    pub admin_role_keys: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_header: default_identity_header(),
            admin_role_keys: default_admin_role_keys(),
        }
    }
}

fn default_identity_header() -> String {
    "x-steward-user".to_string()
}

fn default_admin_role_keys() -> Vec<String> {
    vec!["admin".to_string()]
}

impl AuthConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if HeaderName::from_bytes(self.identity_header.as_bytes()).is_err() {
            return Err(ConfigError::Validation(format!(
                "auth.identity_header '{}' is not a valid HTTP header name",
                self.identity_header
            )));
        }
        if self
            .admin_role_keys
            .iter()
            .all(|key| key.trim().is_empty())
        {
            return Err(ConfigError::Validation(
                "auth.admin_role_keys must contain at least one non-empty role key".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(AuthConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_header_name() {
        let config = AuthConfig {
            identity_header: "x steward user".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_role_keys() {
        let config = AuthConfig {
            admin_role_keys: vec![" ".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
