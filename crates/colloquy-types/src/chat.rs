//! Chat thread and turn types.
//!
//! A thread is a user-owned conversation; a turn is one user message plus
//! the model's answer. Turns are append-only and immutable once created,
//! ordered by creation time within their thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A conversation thread owned by a single user.
///
/// Created lazily on the first message when the caller supplies no thread
/// id. `updated_at` is bumped on every new turn and by title edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One completed exchange within a thread: user message plus model answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub owner_id: Uuid,
    pub user_text: String,
    pub model_text: String,
    /// Total tokens the generation consumed, as reported by the provider
    /// (or estimated when the provider reported none).
    pub tokens_used: u32,
    /// The resolved provider model id this turn was generated with.
    pub model: String,
    pub created_at: DateTime<Utc>,
}

/// A thread summary for listing: recency-ordered, with a preview of the
/// latest exchange. This is what the thread-list cache stores per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
    pub turn_count: u32,
    pub last_user_text: Option<String>,
    pub last_model_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_turn_serialize() {
        let turn = ChatTurn {
            id: Uuid::now_v7(),
            thread_id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            user_text: "Hello".to_string(),
            model_text: "Hi there".to_string(),
            tokens_used: 12,
            model: "claude-sonnet-4-20250514".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains("\"tokens_used\":12"));
        assert!(json.contains("claude-sonnet-4-20250514"));
    }

    #[test]
    fn test_thread_summary_optional_preview() {
        let summary = ThreadSummary {
            id: Uuid::now_v7(),
            title: "Empty thread".to_string(),
            updated_at: Utc::now(),
            turn_count: 0,
            last_user_text: None,
            last_model_text: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["last_user_text"].is_null());
        assert_eq!(json["turn_count"], 0);
    }
}
