//! HTTP/SSE reply transport
//!
//! [`HttpStreamTransport`] POSTs `{session_id, message}` to the configured
//! stream endpoint with `Accept: text/event-stream` and decodes the response
//! body into [`StreamEvent`]s on a background task.
//!
//! # Failure reporting
//!
//! Connect failures, non-2xx statuses, body read errors, idle timeouts and
//! malformed frames all end the stream with a single [`StreamEvent::Error`].
//! A body that closes without `done` or `error` ends with
//! "stream ended before completion".
//!
//! # Timeouts
//!
//! The client has a connect timeout but no overall request timeout, since a
//! reply may legitimately stream for a long time. Instead every wait for the
//! next chunk (and for the response head) is bounded by
//! `stream.idle_timeout_seconds`.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::ACCEPT;

use crate::auth::CredentialProvider;
use crate::config::{ApiConfig, StreamConfig};
use crate::error::{MoodchatError, Result};
use crate::transport::event::decode_frame;
use crate::transport::sse::{SseDecoder, SseFrame};
use crate::transport::{EventSender, EventStream, StreamEvent, StreamRequest, StreamTransport};

/// Reply transport over the backend's streaming endpoint.
#[derive(Debug, Clone)]
pub struct HttpStreamTransport {
    http_client: reqwest::Client,
    endpoint: url::Url,
    credentials: Arc<dyn CredentialProvider>,
    idle_timeout: Duration,
}

impl HttpStreamTransport {
    /// Construct a transport. No network I/O is performed here.
    ///
    /// # Errors
    ///
    /// Returns [`MoodchatError::Config`] when the base URL does not parse.
    pub fn new(
        api: &ApiConfig,
        stream: &StreamConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let mut endpoint = url::Url::parse(&api.base_url)
            .map_err(|e| MoodchatError::Config(format!("Invalid api.base_url: {}", e)))?;
        // Appended rather than joined so a base URL path prefix survives.
        endpoint
            .path_segments_mut()
            .map_err(|_| MoodchatError::Config(format!("{} cannot be a base URL", api.base_url)))?
            .pop_if_empty()
            .extend(stream.path.split('/').filter(|s| !s.is_empty()));
        let http_client = reqwest::Client::builder()
            .connect_timeout(api.connect_timeout())
            .build()
            .map_err(MoodchatError::Http)?;

        Ok(Self {
            http_client,
            endpoint,
            credentials,
            idle_timeout: stream.idle_timeout(),
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl StreamTransport for HttpStreamTransport {
    async fn open(&self, request: StreamRequest) -> Result<EventStream> {
        let token = self.credentials.bearer_token().map_err(|e| {
            MoodchatError::Credential(format!("credential lookup failed: {}", e))
        })?;

        let mut req = self
            .http_client
            .post(self.endpoint.clone())
            .header(ACCEPT, "text/event-stream")
            .json(&request);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        tracing::info!(
            session_id = %request.session_id,
            endpoint = %self.endpoint,
            "Opening reply stream"
        );

        let (events, mut stream) = EventStream::channel();
        let idle_timeout = self.idle_timeout;
        let task = tokio::spawn(async move {
            let sent = tokio::select! {
                _ = events.cancelled() => return,
                sent = tokio::time::timeout(idle_timeout, req.send()) => sent,
            };

            let response = match sent {
                Err(_) => {
                    events.send(transport_error(format!(
                        "no response within {}s",
                        idle_timeout.as_secs()
                    )));
                    return;
                }
                Ok(Err(e)) => {
                    events.send(transport_error(format!("request failed: {}", e)));
                    return;
                }
                Ok(Ok(response)) => response,
            };

            let status = response.status();
            if !status.is_success() {
                // The error body is best-effort detail; a stalled body still fails the reply.
                let body = tokio::select! {
                    _ = events.cancelled() => return,
                    body = tokio::time::timeout(idle_timeout, response.text()) => {
                        body.ok().and_then(|text| text.ok()).unwrap_or_default()
                    }
                };
                events.send(transport_error(format!(
                    "chat service returned HTTP {}: {}",
                    status,
                    body.trim()
                )));
                return;
            }

            forward_sse(response.bytes_stream(), &events, idle_timeout).await;
        });
        stream.attach_task(task);

        Ok(stream)
    }
}

fn transport_error(message: String) -> StreamEvent {
    StreamEvent::error(MoodchatError::Transport(message).to_string())
}

/// Decode an SSE byte stream and deliver its events to `events`.
///
/// Returns after the first terminal event, on cancellation, or when the
/// body ends. Exactly one terminal event is delivered unless the consumer
/// went away first.
pub async fn forward_sse<S, E>(byte_stream: S, events: &EventSender, idle_timeout: Duration)
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    let mut decoder = SseDecoder::new();
    tokio::pin!(byte_stream);

    loop {
        let next = tokio::select! {
            _ = events.cancelled() => {
                tracing::debug!("Reply stream cancelled by consumer");
                return;
            }
            next = tokio::time::timeout(idle_timeout, byte_stream.next()) => next,
        };

        let chunk = match next {
            Err(_) => {
                tracing::warn!(?idle_timeout, "Reply stream went silent");
                events.send(transport_error(format!(
                    "no data received for {}s",
                    idle_timeout.as_secs()
                )));
                return;
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                events.send(transport_error(format!("stream interrupted: {}", e)));
                return;
            }
            Ok(Some(Ok(chunk))) => chunk,
        };

        for frame in decoder.push(&chunk) {
            if dispatch(&frame, events) {
                return;
            }
        }
    }

    if let Some(frame) = decoder.finish() {
        if dispatch(&frame, events) {
            return;
        }
    }
    events.send(transport_error("stream ended before completion".to_string()));
}

/// Deliver one frame; `true` means stop reading.
fn dispatch(frame: &SseFrame, events: &EventSender) -> bool {
    match decode_frame(frame) {
        Ok(Some(event)) => {
            tracing::debug!(?event, "Stream event");
            let terminal = event.is_terminal();
            !events.send(event) || terminal
        }
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, ?frame, "Malformed stream frame");
            events.send(StreamEvent::error(e.to_string()));
            true
        }
    }
}
