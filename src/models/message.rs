//! Message model for chat history and the outgoing queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message typed by the journal owner.
    User,
    /// Reply produced by the assistant.
    Assistant,
}

impl MessageRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Call-to-action kinds the assistant may attach to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Open the diary composer.
    WriteDiary,
    /// Open an existing diary entry.
    ViewDiary,
    /// Open the mood check-in form.
    RecordMood,
    /// Open the emotion overview.
    ViewEmotions,
    /// Open the dashboard.
    ViewDashboard,
}

/// Advisory navigation hint attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub label: String,
    pub path: String,
}

/// Read-only pointer into diary data owned by the diary service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryReference {
    #[serde(alias = "diaryId", alias = "id")]
    pub diary_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl DiaryReference {
    /// A reference carrying only the diary id.
    pub fn bare(diary_id: impl Into<String>) -> Self {
        Self {
            diary_id: diary_id.into(),
            title: None,
            date: None,
        }
    }
}

/// A message in a chat session.
///
/// Messages are immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned id, or a generated UUID for locally created messages.
    #[serde(default = "new_message_id", deserialize_with = "id_as_string")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(
        default = "Utc::now",
        alias = "created_at",
        deserialize_with = "super::timestamp::deserialize"
    )]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<MessageAction>,
    #[serde(default, alias = "relatedDiaries", skip_serializing_if = "Vec::is_empty")]
    pub related_diaries: Vec<DiaryReference>,
    /// Set on an assistant reply whose stream failed before completion.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub incomplete: bool,
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Message ids are integers in some backend versions.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "message id must be a string or number, got {other}"
        ))),
    }
}

impl Message {
    /// Create a user message stamped with the given time.
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: new_message_id(),
            role: MessageRole::User,
            content: content.into(),
            timestamp,
            action: None,
            related_diaries: Vec::new(),
            incomplete: false,
        }
    }

    /// Create a completed assistant reply stamped now.
    pub fn assistant(
        content: impl Into<String>,
        action: Option<MessageAction>,
        related_diaries: Vec<DiaryReference>,
    ) -> Self {
        Self {
            id: new_message_id(),
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            action,
            related_diaries,
            incomplete: false,
        }
    }

    /// Create an assistant reply cut short by a stream failure.
    pub fn partial_assistant(content: impl Into<String>) -> Self {
        Self {
            incomplete: true,
            ..Self::assistant(content, None, Vec::new())
        }
    }
}

/// A user message held back while a reply is still streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl QueuedMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}
