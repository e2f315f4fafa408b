//! Session model for a day-scoped conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Message;

/// Session as returned by the list endpoint (no message history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(alias = "sessionId", alias = "id")]
    pub session_id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(alias = "createdAt", deserialize_with = "super::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt", deserialize_with = "super::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(alias = "isActive")]
    pub is_active: bool,
    #[serde(default, alias = "messageCount", skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

/// A conversation session with its full, chronological message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(alias = "sessionId", alias = "id")]
    pub session_id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(alias = "createdAt", deserialize_with = "super::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updatedAt", deserialize_with = "super::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_active", alias = "isActive")]
    pub is_active: bool,
    #[serde(default)]
    pub messages: Vec<Message>,
}

fn default_active() -> bool {
    true
}

impl ChatSession {
    /// Append a message at the chronological tail.
    pub fn push_message(&mut self, message: Message) {
        self.updated_at = message.timestamp.max(self.updated_at);
        self.messages.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_backend_json() {
        let json = r#"{
            "session_id": "s-1",
            "user_id": "u-1",
            "title": "Tuesday",
            "created_at": "2026-10-13T08:00:00Z",
            "updated_at": "2026-10-13T09:00:00Z",
            "is_active": true
        }"#;
        let summary: SessionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.session_id, "s-1");
        assert!(summary.is_active);
        assert!(summary.message_count.is_none());
    }

    #[test]
    fn test_created_session_without_messages() {
        let json = r#"{
            "sessionId": "s-2",
            "userId": "u-1",
            "createdAt": "2026-10-13T08:00:00",
            "updatedAt": "2026-10-13T08:00:00"
        }"#;
        let session: ChatSession = serde_json::from_str(json).unwrap();
        assert!(session.messages.is_empty());
        assert!(session.is_active);
        assert_eq!(session.title, "");
    }

    #[test]
    fn test_push_message_advances_updated_at() {
        let json = r#"{"session_id":"s","user_id":"u","created_at":"2020-01-01T00:00:00Z","updated_at":"2020-01-01T00:00:00Z"}"#;
        let mut session: ChatSession = serde_json::from_str(json).unwrap();
        let msg = Message::user("hello", Utc::now());
        let ts = msg.timestamp;
        session.push_message(msg);
        assert_eq!(session.updated_at, ts);
        assert_eq!(session.messages.last().unwrap().content, "hello");
    }
}
