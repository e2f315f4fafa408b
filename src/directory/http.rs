//! HTTP session directory backed by the journal REST API
//!
//! Endpoints:
//!
//! - `GET    /api/chat/sessions/{userId}` -- session summaries
//! - `GET    /api/chat/session/{sessionId}` -- one session with messages
//! - `POST   /api/chat/session` `{"user_id": ...}` -- create
//! - `DELETE /api/chat/session/{sessionId}` -- delete
//!
//! List and detail bodies may be bare or wrapped (`{"sessions": [...]}`,
//! `{"session": {...}}`); both shapes are accepted.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::CredentialProvider;
use crate::config::ApiConfig;
use crate::directory::SessionDirectory;
use crate::error::{MoodchatError, Result};
use crate::models::{ChatSession, SessionSummary};

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<SessionSummary>),
    Wrapped { sessions: Vec<SessionSummary> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SessionBody {
    Bare(ChatSession),
    Wrapped { session: ChatSession },
}

/// [`SessionDirectory`] over the backend's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpSessionDirectory {
    http_client: reqwest::Client,
    base_url: url::Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpSessionDirectory {
    /// Construct a directory client. No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`MoodchatError::Config`] if `api.base_url` does not parse and
    /// [`MoodchatError::Http`] if the HTTP client cannot be built.
    pub fn new(api: &ApiConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let base_url = url::Url::parse(&api.base_url)
            .map_err(|e| MoodchatError::Config(format!("Invalid api.base_url: {}", e)))?;
        let http_client = reqwest::Client::builder()
            .timeout(api.request_timeout())
            .connect_timeout(api.connect_timeout())
            .build()
            .map_err(MoodchatError::Http)?;

        Ok(Self {
            http_client,
            base_url,
            credentials,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<url::Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MoodchatError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let token = self
            .credentials
            .bearer_token()
            .map_err(|e| MoodchatError::Session(format!("credential lookup failed: {}", e)))?;
        Ok(match token {
            Some(token) => req.bearer_auth(token),
            None => req,
        })
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authorize(req)?
            .send()
            .await
            .map_err(|e| MoodchatError::Session(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MoodchatError::Session(format!(
                "{} returned HTTP {}: {}",
                what,
                status,
                body.trim()
            ))
            .into());
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|e| MoodchatError::Session(format!("{} body unreadable: {}", what, e)))?;
        serde_json::from_str(&body).map_err(|e| {
            MoodchatError::Session(format!("{} response did not parse: {}", what, e)).into()
        })
    }
}

#[async_trait]
impl SessionDirectory for HttpSessionDirectory {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        let url = self.endpoint(&["api", "chat", "sessions", user_id])?;
        tracing::debug!(%url, "Listing chat sessions");

        let response = self.send(self.http_client.get(url), "list sessions").await?;
        let sessions = match Self::decode::<ListBody>(response, "list sessions").await? {
            ListBody::Bare(sessions) | ListBody::Wrapped { sessions } => sessions,
        };
        tracing::debug!(user_id, count = sessions.len(), "Listed chat sessions");
        Ok(sessions)
    }

    async fn get_session(&self, session_id: &str) -> Result<ChatSession> {
        let url = self.endpoint(&["api", "chat", "session", session_id])?;
        tracing::debug!(%url, "Fetching chat session");

        let response = self.send(self.http_client.get(url), "get session").await?;
        match Self::decode::<SessionBody>(response, "get session").await? {
            SessionBody::Bare(session) | SessionBody::Wrapped { session } => Ok(session),
        }
    }

    async fn create_session(&self, user_id: &str) -> Result<ChatSession> {
        let url = self.endpoint(&["api", "chat", "session"])?;
        let req = self
            .http_client
            .post(url)
            .json(&serde_json::json!({ "user_id": user_id }));

        let response = self.send(req, "create session").await?;
        let session = match Self::decode::<SessionBody>(response, "create session").await? {
            SessionBody::Bare(session) | SessionBody::Wrapped { session } => session,
        };
        tracing::info!(user_id, session_id = %session.session_id, "Created chat session");
        Ok(session)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "chat", "session", session_id])?;
        self.send(self.http_client.delete(url), "delete session")
            .await?;
        tracing::info!(session_id, "Deleted chat session");
        Ok(())
    }
}
