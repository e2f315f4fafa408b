//! Streaming state for the one reply in flight
//!
//! The machine moves `Idle -> Awaiting -> Receiving -> Idle`. `Awaiting` is
//! the typing-indicator interval between [`StreamingState::start`] and the
//! first token; the first token (even an empty one) is an explicit transition
//! guarded by `first_token_seen`, so typing is cleared exactly once per
//! stream.

use crate::models::{DiaryReference, MessageAction};

/// Coarse phase of the machine, derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// No reply in flight.
    Idle,
    /// Stream started, no token yet (typing indicator on).
    Awaiting,
    /// At least one token received.
    Receiving,
}

impl std::fmt::Display for StreamPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Awaiting => "awaiting",
            Self::Receiving => "receiving",
        };
        write!(f, "{}", name)
    }
}

/// Everything the machine accumulates for the reply in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamingState {
    is_streaming: bool,
    is_typing: bool,
    content: String,
    error: Option<String>,
    first_token_seen: bool,
    pending_action: Option<MessageAction>,
    pending_references: Vec<DiaryReference>,
}

/// What a finished stream leaves behind for the assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledReply {
    pub content: String,
    pub action: Option<MessageAction>,
    pub references: Vec<DiaryReference>,
}

impl StreamingState {
    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn first_token_seen(&self) -> bool {
        self.first_token_seen
    }

    pub fn pending_action(&self) -> Option<&MessageAction> {
        self.pending_action.as_ref()
    }

    pub fn pending_references(&self) -> &[DiaryReference] {
        &self.pending_references
    }

    pub fn phase(&self) -> StreamPhase {
        match (self.is_streaming, self.first_token_seen) {
            (false, _) => StreamPhase::Idle,
            (true, false) => StreamPhase::Awaiting,
            (true, true) => StreamPhase::Receiving,
        }
    }

    /// Enter `Awaiting`. Repeated calls leave the same state.
    pub fn start(&mut self) {
        *self = Self {
            is_streaming: true,
            is_typing: true,
            ..Self::default()
        };
    }

    /// The first-token transition. Returns `true` only for the call that
    /// turned typing off.
    pub fn mark_first_token(&mut self) -> bool {
        if self.first_token_seen {
            return false;
        }
        self.first_token_seen = true;
        self.is_typing = false;
        true
    }

    /// Append a token in arrival order. Empty tokens still count as the
    /// first token.
    pub fn append(&mut self, token: &str) {
        self.mark_first_token();
        self.content.push_str(token);
    }

    /// Remember the reply's call-to-action; a later one replaces it.
    pub fn set_action(&mut self, action: MessageAction) {
        self.pending_action = Some(action);
    }

    /// Accumulate diary references, keeping the first occurrence of each id.
    pub fn add_references(&mut self, references: impl IntoIterator<Item = DiaryReference>) {
        for reference in references {
            if !self
                .pending_references
                .iter()
                .any(|r| r.diary_id == reference.diary_id)
            {
                self.pending_references.push(reference);
            }
        }
    }

    /// Leave the stream successfully, returning what it produced.
    ///
    /// The related diaries follow `diary_ids` order, enriched with any
    /// title/date received earlier. Without ids, the references received
    /// during the stream are kept as they are.
    pub fn finish(&mut self, diary_ids: &[String]) -> SettledReply {
        let state = std::mem::take(self);
        let references = if diary_ids.is_empty() {
            state.pending_references
        } else {
            diary_ids
                .iter()
                .map(|id| {
                    state
                        .pending_references
                        .iter()
                        .find(|r| &r.diary_id == id)
                        .cloned()
                        .unwrap_or_else(|| DiaryReference::bare(id.clone()))
                })
                .collect()
        };
        SettledReply {
            content: state.content,
            action: state.pending_action,
            references,
        }
    }

    /// Leave the stream with an error. Returns the text accumulated so far.
    pub fn fail(&mut self, message: impl Into<String>) -> String {
        let state = std::mem::take(self);
        self.error = Some(message.into());
        state.content
    }

    /// Back to idle without an error or a reply.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
