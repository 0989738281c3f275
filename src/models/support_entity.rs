use serde::{Deserialize, Serialize};

/// Kinds of support-domain records that can be purged in bulk.
///
/// Derived records (classifications, AI comments, conversation logs,
/// messages) hang off a conversation; triage sessions and learning examples
/// stand alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportEntity {
    Classification,
    AiComment,
    ConversationLog,
    Message,
    Conversation,
    TriageSession,
    LearningExample,
}

impl SupportEntity {
    /// Every kind, in no particular order.
    pub const ALL: [SupportEntity; 7] = [
        SupportEntity::Classification,
        SupportEntity::AiComment,
        SupportEntity::ConversationLog,
        SupportEntity::Message,
        SupportEntity::Conversation,
        SupportEntity::TriageSession,
        SupportEntity::LearningExample,
    ];

    /// Purge order for a hard reset: children before their parent
    /// conversation, conversations before session state.
    pub const HARD_RESET_ORDER: [SupportEntity; 6] = [
        SupportEntity::Classification,
        SupportEntity::AiComment,
        SupportEntity::ConversationLog,
        SupportEntity::Message,
        SupportEntity::Conversation,
        SupportEntity::TriageSession,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportEntity::Classification => "classification",
            SupportEntity::AiComment => "ai_comment",
            SupportEntity::ConversationLog => "conversation_log",
            SupportEntity::Message => "message",
            SupportEntity::Conversation => "conversation",
            SupportEntity::TriageSession => "triage_session",
            SupportEntity::LearningExample => "learning_example",
        }
    }

    /// Backing table name. Static per kind, so safe to interpolate into SQL.
    pub fn table_name(&self) -> &'static str {
        match self {
            SupportEntity::Classification => "classifications",
            SupportEntity::AiComment => "ai_comments",
            SupportEntity::ConversationLog => "conversation_logs",
            SupportEntity::Message => "messages",
            SupportEntity::Conversation => "conversations",
            SupportEntity::TriageSession => "triage_sessions",
            SupportEntity::LearningExample => "learning_examples",
        }
    }

    /// Whether rows of this kind reference a parent conversation.
    pub fn is_conversation_child(&self) -> bool {
        matches!(
            self,
            SupportEntity::Classification
                | SupportEntity::AiComment
                | SupportEntity::ConversationLog
                | SupportEntity::Message
        )
    }
}

impl std::fmt::Display for SupportEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_reset_order_children_first() {
        let order = SupportEntity::HARD_RESET_ORDER;
        let conversation_pos = order
            .iter()
            .position(|e| *e == SupportEntity::Conversation)
            .unwrap();

        for (i, entity) in order.iter().enumerate() {
            if entity.is_conversation_child() {
                assert!(i < conversation_pos, "{entity} must precede conversations");
            }
        }
        assert_eq!(order.last(), Some(&SupportEntity::TriageSession));
    }

    #[test]
    fn test_hard_reset_leaves_learning_examples() {
        assert!(
            !SupportEntity::HARD_RESET_ORDER.contains(&SupportEntity::LearningExample)
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for entity in SupportEntity::ALL {
            let json = serde_json::to_value(entity).unwrap();
            assert_eq!(json, entity.as_str());
        }
    }
}
