use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Actor recorded for system-initiated entries
pub const SYSTEM_ACTOR: &str = "system";

/// Channel through which an action was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformedVia {
    /// An administrator through the admin API
    Admin,
    /// An operator through the command line
    Cli,
    /// A scheduled background job
    Schedule,
}

impl PerformedVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformedVia::Admin => "admin",
            PerformedVia::Cli => "cli",
            PerformedVia::Schedule => "schedule",
        }
    }
}

impl std::fmt::Display for PerformedVia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PerformedVia {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(PerformedVia::Admin),
            "cli" => Ok(PerformedVia::Cli),
            "schedule" => Ok(PerformedVia::Schedule),
            _ => Err(format!("Invalid performed_via: {}", s)),
        }
    }
}

/// An append-only audit record of a governance action.
///
/// Entries are never updated; they are only pruned by age.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogEntry {
    pub id: Uuid,
    /// The action performed (e.g., "support.hard_reset", "support.backup")
    pub action: String,
    /// Human readable summary
    pub description: String,
    pub performed_at: DateTime<Utc>,
    /// User id of the actor, or `system`
    pub performed_by: String,
    pub performed_via: PerformedVia,
    pub success: bool,
    pub metadata: JsonValue,
}

/// Input for appending an action log entry
#[derive(Debug, Clone)]
pub struct CreateActionLogEntry {
    pub action: String,
    pub description: String,
    pub performed_by: String,
    pub performed_via: PerformedVia,
    pub success: bool,
    pub metadata: JsonValue,
    /// Defaults to the insertion time when unset
    pub performed_at: Option<DateTime<Utc>>,
}
