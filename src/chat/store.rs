//! Chat store: session, history, queue and streaming state for one panel
//!
//! [`ChatStore`] is synchronous and owns all mutable chat state. It never
//! performs I/O; operations that need the network return a
//! [`StreamRequest`] for the caller (the engine) to open. Operations whose
//! precondition is "streaming active" are ignored with a warning otherwise.

use chrono::Utc;

use crate::chat::queue::MessageQueue;
use crate::chat::state::{StreamPhase, StreamingState};
use crate::error::{MoodchatError, Result};
use crate::models::{ChatSession, DiaryReference, Message, MessageAction, QueuedMessage};
use crate::transport::StreamRequest;

/// Outcome of [`ChatStore::send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendDecision {
    /// A reply is streaming; the message waits at this 1-based position.
    Queued { position: usize },
    /// The user message was appended and streaming started; open this.
    Dispatch(StreamRequest),
}

/// Single-writer state for one open chat panel.
#[derive(Debug, Default)]
pub struct ChatStore {
    session: Option<ChatSession>,
    streaming: StreamingState,
    queue: MessageQueue,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: ChatSession) -> Self {
        Self {
            session: Some(session),
            ..Self::default()
        }
    }

    /// Replace the session, discarding any in-flight state and queue.
    pub fn set_session(&mut self, session: ChatSession) {
        self.streaming.reset();
        self.queue.clear();
        self.session = Some(session);
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    pub fn messages(&self) -> &[Message] {
        self.session
            .as_ref()
            .map(|s| s.messages.as_slice())
            .unwrap_or_default()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.is_streaming()
    }

    pub fn is_typing(&self) -> bool {
        self.streaming.is_typing()
    }

    pub fn streaming_content(&self) -> &str {
        self.streaming.content()
    }

    pub fn error(&self) -> Option<&str> {
        self.streaming.error()
    }

    pub fn phase(&self) -> StreamPhase {
        self.streaming.phase()
    }

    pub fn streaming_state(&self) -> &StreamingState {
        &self.streaming
    }

    pub fn message_queue(&self) -> Vec<&QueuedMessage> {
        self.queue.iter().collect()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Enter the awaiting-first-token state. Idempotent; clears `error`.
    pub fn start_streaming(&mut self) {
        self.streaming.start();
        tracing::debug!("Streaming started");
    }

    /// Append one token. Returns `false` (and changes nothing) when no
    /// reply is streaming, e.g. a late event after cancellation.
    pub fn append_streaming_content(&mut self, token: &str) -> bool {
        if !self.streaming.is_streaming() {
            tracing::warn!(len = token.len(), "Discarding token received while idle");
            return false;
        }
        if !self.streaming.first_token_seen() {
            tracing::debug!("First token received");
        }
        self.streaming.append(token);
        true
    }

    pub fn record_action(&mut self, action: MessageAction) {
        if !self.streaming.is_streaming() {
            tracing::warn!("Discarding action received while idle");
            return;
        }
        self.streaming.set_action(action);
    }

    pub fn record_references(&mut self, references: Vec<DiaryReference>) {
        if !self.streaming.is_streaming() {
            tracing::warn!("Discarding diary references received while idle");
            return;
        }
        self.streaming.add_references(references);
    }

    /// Settle successfully: append the assistant message, reset the flags
    /// and hand back the next queued message, if any.
    pub fn finish_streaming(&mut self, diary_ids: &[String]) -> Option<QueuedMessage> {
        if !self.streaming.is_streaming() {
            tracing::warn!("finish_streaming called while idle; ignoring");
            return None;
        }
        let reply = self.streaming.finish(diary_ids);
        let message = Message::assistant(reply.content, reply.action, reply.references);
        tracing::info!(
            len = message.content.len(),
            related = message.related_diaries.len(),
            "Reply settled"
        );
        self.append_message(message);
        self.queue.pop()
    }

    /// Settle with an error.
    ///
    /// `partial` overrides the accumulated text when given. Non-empty
    /// partial text is kept as an assistant message flagged `incomplete`.
    pub fn handle_stream_error(
        &mut self,
        message: impl Into<String>,
        partial: Option<&str>,
    ) -> Option<QueuedMessage> {
        let message = message.into();
        if !self.streaming.is_streaming() {
            tracing::warn!(error = %message, "Stream error while idle; ignoring");
            return None;
        }
        let accumulated = self.streaming.fail(message.clone());
        let partial = partial.map(str::to_string).unwrap_or(accumulated);
        tracing::warn!(error = %message, partial_len = partial.len(), "Reply failed");

        if !partial.is_empty() {
            self.append_message(Message::partial_assistant(partial));
        }
        self.queue.pop()
    }

    /// Append `content` to the queue tail; returns its 1-based position.
    pub fn queue_message(&mut self, content: impl Into<String>) -> usize {
        let position = self.queue.push(QueuedMessage::new(content));
        tracing::debug!(position, "Message queued");
        position
    }

    /// Take the next queued message without settling anything. Used to
    /// pick up messages left over when the engine finds itself idle.
    pub fn pop_queued(&mut self) -> Option<QueuedMessage> {
        if self.streaming.is_streaming() {
            return None;
        }
        self.queue.pop()
    }

    /// Send or queue a user message.
    ///
    /// # Errors
    ///
    /// - [`MoodchatError::Validation`] for empty or whitespace-only content;
    ///   nothing changes.
    /// - [`MoodchatError::NoActiveSession`] when idle and no session was
    ///   resolved.
    pub fn send_message(&mut self, content: &str) -> Result<SendDecision> {
        if content.trim().is_empty() {
            return Err(MoodchatError::Validation("message is empty".into()).into());
        }
        if self.streaming.is_streaming() {
            let position = self.queue_message(content);
            return Ok(SendDecision::Queued { position });
        }
        self.begin(content).map(SendDecision::Dispatch)
    }

    /// Start the reply for a message popped from the queue.
    pub fn dispatch_queued(&mut self, queued: QueuedMessage) -> Result<StreamRequest> {
        self.begin(&queued.content)
    }

    /// Abandon the reply in flight without a message, and drop the queue.
    /// Returns how many queued messages were discarded.
    pub fn cancel_streaming(&mut self) -> usize {
        self.streaming.reset();
        let dropped = self.queue.clear();
        tracing::info!(dropped, "Reply cancelled");
        dropped
    }

    fn begin(&mut self, content: &str) -> Result<StreamRequest> {
        let session = self.session.as_mut().ok_or(MoodchatError::NoActiveSession)?;
        session.push_message(Message::user(content, Utc::now()));
        let request = StreamRequest {
            session_id: session.session_id.clone(),
            message: content.to_string(),
        };
        self.start_streaming();
        Ok(request)
    }

    fn append_message(&mut self, message: Message) {
        match self.session.as_mut() {
            Some(session) => session.push_message(message),
            None => tracing::warn!("No session to append the reply to; dropping it"),
        }
    }
}
