use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A role assignment as it appears in user records.
///
/// Older records store bare role keys (`"admin"`), newer ones store role
/// objects (`{"key": "admin", "name": "Administrator"}`). Both shapes are
/// accepted; extra fields on the object form are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Key(String),
    Object { key: String },
}

impl RoleRef {
    pub fn key(&self) -> &str {
        match self {
            RoleRef::Key(key) => key,
            RoleRef::Object { key } => key,
        }
    }
}

/// A user known to the support application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub roles: Vec<RoleRef>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or replacing a user
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub id: String,
    pub display_name: Option<String>,
    pub roles: Vec<RoleRef>,
}
