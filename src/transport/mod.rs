//! Reply stream transport
//!
//! This module defines the [`StreamTransport`] trait that opens one reply
//! stream per outgoing message, and the canonical [`StreamEvent`] every
//! implementation decodes its wire data into. Concrete implementations live
//! in submodules:
//!
//! - [`http::HttpStreamTransport`] -- POSTs the message and decodes the
//!   `text/event-stream` response.
//! - [`fake::FakeStreamTransport`] -- in-process fake used in tests
//!   (cfg(test) only).
//!
//! # Design
//!
//! An opened stream is an [`EventStream`]: a lazy, finite, non-restartable
//! [`Stream`] of [`StreamEvent`]s. Transport and protocol failures do not
//! surface as `Err` items; they arrive as a final [`StreamEvent::Error`] so
//! the consumer handles exactly one event type. Every stream ends with
//! either `Done` or `Error`.
//!
//! [`EventStream::cancel`] releases the connection immediately. After
//! cancellation the stream yields `None`, even for events that were already
//! buffered.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::models::{DiaryReference, MessageAction};

pub mod event;
pub mod http;
pub mod sse;

#[cfg(test)]
pub mod fake;

pub use http::HttpStreamTransport;

/// One decoded event of a reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental assistant text; may be empty.
    Token(String),
    /// Call-to-action for the reply in progress.
    Action(MessageAction),
    /// Diaries the reply refers to.
    DiaryReferences(Vec<DiaryReference>),
    /// Reply finished; carries the final related-diary ids.
    Done { diary_ids: Vec<String> },
    /// Transport, protocol or upstream failure.
    Error { message: String },
}

impl StreamEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// `Done` and `Error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

/// Destination and content of one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamRequest {
    pub session_id: String,
    pub message: String,
}

/// Opens reply streams.
#[async_trait]
pub trait StreamTransport: Send + Sync + std::fmt::Debug {
    /// Start a reply stream for `request`.
    ///
    /// Connection and HTTP failures are reported on the returned stream as
    /// [`StreamEvent::Error`]; `Err` is only returned when the request cannot
    /// be built at all.
    async fn open(&self, request: StreamRequest) -> Result<EventStream>;
}

/// Producer half of an [`EventStream`].
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<StreamEvent>,
    cancel: CancellationToken,
}

impl EventSender {
    /// Deliver an event. Returns `false` once the stream was cancelled or
    /// dropped, telling the producer to stop.
    pub fn send(&self, event: StreamEvent) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(event).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    /// Resolves when the consumer cancels.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

/// Consumer half: a typed, cancellable sequence of [`StreamEvent`]s.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<StreamEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl EventStream {
    /// Create a connected sender/stream pair.
    pub fn channel() -> (EventSender, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        (
            EventSender {
                tx,
                cancel: cancel.clone(),
            },
            EventStream {
                rx,
                cancel,
                task: None,
            },
        )
    }

    /// A finished stream replaying `events`; handy for fakes.
    pub fn from_events(events: impl IntoIterator<Item = StreamEvent>) -> Self {
        let (tx, stream) = Self::channel();
        for event in events {
            tx.send(event);
        }
        stream
    }

    /// Tie the producer task's lifetime to this stream.
    pub fn attach_task(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    /// Drop the connection and discard anything not yet consumed.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for EventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            // A cancel may land while the event was in flight.
            Poll::Ready(Some(_)) if self.cancel.is_cancelled() => Poll::Ready(None),
            other => other,
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
