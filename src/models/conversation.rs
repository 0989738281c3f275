use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a support conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Open,
    Pending,
    Resolved,
    Archived,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Open => "open",
            ConversationStatus::Pending => "pending",
            ConversationStatus::Resolved => "resolved",
            ConversationStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ConversationStatus::Open),
            "pending" => Ok(ConversationStatus::Pending),
            "resolved" => Ok(ConversationStatus::Resolved),
            "archived" => Ok(ConversationStatus::Archived),
            _ => Err(format!("Invalid conversation status: {}", s)),
        }
    }
}

/// A support thread.
///
/// Retention works off two timestamps: `latest_message_at` decides when an
/// active thread is archived, `archived_at` decides when an archived thread
/// is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub subject: String,
    pub status: ConversationStatus,
    pub latest_message_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Input for creating a conversation (used by sync ingestion and tests)
#[derive(Debug, Clone)]
pub struct CreateConversation {
    pub subject: String,
    pub status: ConversationStatus,
    pub latest_message_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl CreateConversation {
    /// An open conversation whose last message arrived at `latest_message_at`.
    pub fn open(subject: impl Into<String>, latest_message_at: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            status: ConversationStatus::Open,
            latest_message_at,
            archived_at: None,
        }
    }
}
