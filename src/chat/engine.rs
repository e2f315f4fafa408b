//! Chat engine: the single writer that drives replies
//!
//! [`ChatEngine`] owns a [`ChatStore`], the reply transport and the one
//! active [`EventStream`]. Every state change happens in reaction to one
//! discrete event (a command from the UI or an event from the stream), so
//! no locking is involved: [`ChatEngine::run`] is a `tokio::select!` loop
//! over a command channel and the active stream.
//!
//! # Ordering
//!
//! - Stream events are applied in arrival order.
//! - Queued messages are dispatched one at a time, in submission order.
//! - The settle of reply N always happens before queued message N+1 is
//!   dispatched; a failed reply still lets the queue continue.
//!
//! # Cancellation
//!
//! [`ChatEngine::cancel_reply`], [`ChatEngine::close`], a
//! [`ChatCommand::Close`] or dropping the command sender cancel the active
//! stream. Nothing received after that is applied.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot};

use crate::chat::state::StreamPhase;
use crate::chat::store::{ChatStore, SendDecision};
use crate::error::{MoodchatError, Result};
use crate::models::{ChatSession, Message, QueuedMessage};
use crate::session::SessionResolver;
use crate::transport::{EventStream, StreamEvent, StreamRequest, StreamTransport};

/// Requests a UI sends to a running engine.
#[derive(Debug)]
pub enum ChatCommand {
    /// Send, or queue while a reply is streaming.
    Send(String),
    /// Abandon the reply in flight and drop the queue.
    Cancel,
    /// Replace the current session (e.g. after a reset).
    SwitchSession(Box<ChatSession>),
    /// Report a [`ChatStatus`] snapshot.
    Status(oneshot::Sender<ChatStatus>),
    /// Cancel everything and stop the loop.
    Close,
}

/// Notifications for the UI, in the order things happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatUpdate {
    /// A message was held back at this 1-based queue position.
    Queued { position: usize },
    /// A reply stream is being opened for this user message.
    Started { message: String },
    /// A token was applied.
    Token(String),
    /// The reply completed and was appended.
    Settled(Message),
    /// The reply failed; `partial` is the incomplete message, if one was kept.
    Failed {
        error: String,
        partial: Option<Message>,
    },
    /// The reply was cancelled and this many queued messages were dropped.
    Cancelled { dropped: usize },
    /// A `Send` command was rejected before anything happened.
    Rejected(String),
}

/// Point-in-time view of the engine, for `/status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatStatus {
    pub session_id: Option<String>,
    pub phase: StreamPhase,
    pub messages: usize,
    pub queued: usize,
    pub error: Option<String>,
}

/// Single-writer service object for one open chat panel.
#[derive(Debug)]
pub struct ChatEngine {
    store: ChatStore,
    transport: Arc<dyn StreamTransport>,
    active: Option<EventStream>,
    updates: Option<mpsc::UnboundedSender<ChatUpdate>>,
}

impl ChatEngine {
    pub fn new(transport: Arc<dyn StreamTransport>) -> Self {
        Self {
            store: ChatStore::new(),
            transport,
            active: None,
            updates: None,
        }
    }

    pub fn with_session(transport: Arc<dyn StreamTransport>, session: ChatSession) -> Self {
        Self {
            store: ChatStore::with_session(session),
            ..Self::new(transport)
        }
    }

    /// Receive [`ChatUpdate`]s from now on. Replaces any earlier subscriber.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ChatUpdate> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.updates = Some(tx);
        rx
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// No reply in flight and nothing left to dispatch.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && !self.store.is_streaming() && self.store.queue_len() == 0
    }

    pub fn status(&self) -> ChatStatus {
        ChatStatus {
            session_id: self.store.session_id().map(str::to_string),
            phase: self.store.phase(),
            messages: self.store.messages().len(),
            queued: self.store.queue_len(),
            error: self.store.error().map(str::to_string),
        }
    }

    /// Resolve today's session for `user_id` and make it current.
    ///
    /// `Ok(None)` when the resolver has no credential; the engine keeps its
    /// previous session.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's [`MoodchatError::Session`] or
    /// [`MoodchatError::Credential`]; the engine keeps its previous session
    /// in that case.
    pub async fn open_today(
        &mut self,
        resolver: &SessionResolver,
        user_id: &str,
    ) -> Result<Option<&ChatSession>> {
        let Some(session) = resolver.get_or_create_today_session(user_id).await? else {
            return Ok(None);
        };
        self.switch_session(session);
        Ok(self.store.session())
    }

    /// Make `session` current, cancelling anything in flight.
    pub fn switch_session(&mut self, session: ChatSession) {
        self.cancel_active();
        tracing::info!(session_id = %session.session_id, messages = session.messages.len(), "Chat session opened");
        self.store.set_session(session);
    }

    /// Send `content`, or queue it while a reply is streaming.
    ///
    /// A transport that cannot be opened is not an `Err` here: the reply
    /// settles with an error like any other stream failure.
    ///
    /// # Errors
    ///
    /// [`MoodchatError::Validation`] and [`MoodchatError::NoActiveSession`]
    /// from [`ChatStore::send_message`].
    pub async fn send_message(&mut self, content: &str) -> Result<SendDecision> {
        let decision = self.store.send_message(content)?;
        match &decision {
            SendDecision::Queued { position } => {
                self.emit(ChatUpdate::Queued {
                    position: *position,
                })
            }
            SendDecision::Dispatch(request) => self.open(request.clone()).await,
        }
        Ok(decision)
    }

    /// Apply the next stream event, opening the next queued reply when one
    /// settles. Returns `false` once there is nothing left to wait for.
    pub async fn step(&mut self) -> bool {
        let Some(stream) = self.active.as_mut() else {
            return self.dispatch_leftover().await;
        };
        let item = stream.next().await;
        self.on_stream_item(item).await;
        true
    }

    /// Drive replies (and the queue) until everything settled.
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    /// Abandon the reply in flight without a message and drop the queue.
    /// Returns the number of queued messages dropped.
    pub fn cancel_reply(&mut self) -> usize {
        self.cancel_active();
        if !self.store.is_streaming() && self.store.queue_len() == 0 {
            return 0;
        }
        let dropped = self.store.cancel_streaming();
        self.emit(ChatUpdate::Cancelled { dropped });
        dropped
    }

    /// The panel is going away: release the connection and settle to idle.
    pub fn close(&mut self) {
        self.cancel_active();
        if self.store.is_streaming() {
            self.store.cancel_streaming();
        }
        tracing::debug!("Chat engine closed");
    }

    /// Serve `commands` until `Close` or until the sender is dropped.
    /// Returns the final store.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<ChatCommand>) -> ChatStore {
        loop {
            if self.active.is_none() {
                self.dispatch_leftover().await;
            }

            tokio::select! {
                command = commands.recv() => match command {
                    Some(ChatCommand::Send(content)) => {
                        if let Err(e) = self.send_message(&content).await {
                            tracing::debug!(error = %e, "Send rejected");
                            self.emit(ChatUpdate::Rejected(e.to_string()));
                        }
                    }
                    Some(ChatCommand::Cancel) => {
                        self.cancel_reply();
                    }
                    Some(ChatCommand::SwitchSession(session)) => self.switch_session(*session),
                    Some(ChatCommand::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    Some(ChatCommand::Close) | None => break,
                },
                item = next_event(&mut self.active) => self.on_stream_item(item).await,
            }
        }

        self.close();
        self.store
    }

    fn emit(&self, update: ChatUpdate) {
        if let Some(tx) = &self.updates {
            let _ = tx.send(update);
        }
    }

    fn cancel_active(&mut self) {
        if let Some(mut stream) = self.active.take() {
            stream.cancel();
        }
    }

    /// Open a reply stream, settling immediately (and moving on through
    /// the queue) when the transport refuses.
    async fn open(&mut self, mut request: StreamRequest) {
        loop {
            self.emit(ChatUpdate::Started {
                message: request.message.clone(),
            });
            match self.transport.open(request).await {
                Ok(stream) => {
                    self.active = Some(stream);
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Could not open reply stream");
                    match self.settle_error(e.to_string()) {
                        Some(next) => request = next,
                        None => return,
                    }
                }
            }
        }
    }

    async fn on_stream_item(&mut self, item: Option<StreamEvent>) {
        let next = match item {
            Some(event) => self.apply(event),
            None => {
                self.active = None;
                if self.store.is_streaming() {
                    self.settle_error("reply stream closed unexpectedly".to_string())
                } else {
                    None
                }
            }
        };
        if let Some(request) = next {
            self.open(request).await;
        }
    }

    /// Apply one event; returns the next reply to open when one settled
    /// and the queue was not empty.
    fn apply(&mut self, event: StreamEvent) -> Option<StreamRequest> {
        match event {
            StreamEvent::Token(token) => {
                if self.store.append_streaming_content(&token) {
                    self.emit(ChatUpdate::Token(token));
                }
                None
            }
            StreamEvent::Action(action) => {
                self.store.record_action(action);
                None
            }
            StreamEvent::DiaryReferences(references) => {
                self.store.record_references(references);
                None
            }
            StreamEvent::Done { diary_ids } => {
                self.active = None;
                if !self.store.is_streaming() {
                    tracing::warn!("Done received while idle; ignoring");
                    return None;
                }
                let next = self.store.finish_streaming(&diary_ids);
                if let Some(reply) = self.store.messages().last().cloned() {
                    self.emit(ChatUpdate::Settled(reply));
                }
                self.next_request(next)
            }
            StreamEvent::Error { message } => {
                self.active = None;
                self.settle_error(message)
            }
        }
    }

    fn settle_error(&mut self, message: String) -> Option<StreamRequest> {
        if !self.store.is_streaming() {
            tracing::warn!(error = %message, "Stream error while idle; ignoring");
            return None;
        }
        let before = self.store.messages().len();
        let next = self.store.handle_stream_error(message.clone(), None);
        let partial = if self.store.messages().len() > before {
            self.store.messages().last().cloned()
        } else {
            None
        };
        self.emit(ChatUpdate::Failed {
            error: message,
            partial,
        });
        self.next_request(next)
    }

    fn next_request(&mut self, next: Option<QueuedMessage>) -> Option<StreamRequest> {
        let queued = next?;
        tracing::debug!(remaining = self.store.queue_len(), "Dispatching queued message");
        match self.store.dispatch_queued(queued) {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::warn!(error = %e, "Could not dispatch queued message");
                None
            }
        }
    }

    /// Dispatch a message left in the queue while idle. Returns `true` when
    /// a reply was started.
    async fn dispatch_leftover(&mut self) -> bool {
        let Some(queued) = self.store.pop_queued() else {
            return false;
        };
        match self.store.dispatch_queued(queued) {
            Ok(request) => {
                self.open(request).await;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not dispatch queued message");
                false
            }
        }
    }
}

/// Next event of the active stream; pending forever when there is none.
async fn next_event(active: &mut Option<EventStream>) -> Option<StreamEvent> {
    match active {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
