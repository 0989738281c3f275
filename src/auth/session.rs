//! Caller sessions and identity normalization.
//!
//! A session names its user either by bare id (`"u_123"`) or by a linked-record
//! reference (`{"id": "u_123"}`). Users' role entries are likewise either bare
//! keys or `{"key": ...}` objects. Everything downstream works with the single
//! canonical shape produced here.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{PerformedVia, User};

/// Reference to a user as it appears in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    Linked { id: String },
}

impl UserRef {
    /// The referenced id, trimmed. `None` if blank.
    pub fn id(&self) -> Option<&str> {
        let raw = match self {
            UserRef::Id(id) => id,
            UserRef::Linked { id } => id,
        };
        let id = raw.trim();
        (!id.is_empty()).then_some(id)
    }
}

/// The caller of an operation and the channel it arrived through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserRef>,
    pub via: PerformedVia,
}

impl Session {
    /// A session with no identity. Fails every guard.
    pub fn anonymous(via: PerformedVia) -> Self {
        Self { user: None, via }
    }

    pub fn for_user(id: impl Into<String>, via: PerformedVia) -> Self {
        Self {
            user: Some(UserRef::Id(id.into())),
            via,
        }
    }

    /// Parse an identity header value.
    ///
    /// Values starting with `{` or `"` are read as JSON (a linked-record
    /// reference or a quoted id); anything else is taken as a bare id.
    /// Unparseable JSON yields an anonymous session.
    pub fn from_header_value(value: &str, via: PerformedVia) -> Self {
        let value = value.trim();
        let user = if value.starts_with('{') || value.starts_with('"') {
            serde_json::from_str::<UserRef>(value).ok()
        } else if value.is_empty() {
            None
        } else {
            Some(UserRef::Id(value.to_string()))
        };
        Self { user, via }
    }

    /// Canonical user id, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(UserRef::id)
    }
}

/// A user reduced to what authorization needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUser {
    pub id: String,
    /// Role keys, trimmed and lowercased.
    pub roles: BTreeSet<String>,
}

impl CanonicalUser {
    pub fn has_any_role(&self, keys: &BTreeSet<String>) -> bool {
        !self.roles.is_disjoint(keys)
    }
}

/// Normalize a role key for comparison.
pub fn normalize_role_key(key: &str) -> Option<String> {
    let key = key.trim();
    (!key.is_empty()).then(|| key.to_lowercase())
}

/// Reduce a stored user to its canonical shape.
pub fn canonicalize(user: &User) -> CanonicalUser {
    CanonicalUser {
        id: user.id.trim().to_string(),
        roles: user
            .roles
            .iter()
            .filter_map(|role| normalize_role_key(role.key()))
            .collect(),
    }
}
