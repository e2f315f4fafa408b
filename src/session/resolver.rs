//! Today's-session resolver
//!
//! A session is "today's session" when it is active and was created on the
//! caller's current calendar day, in the caller's time zone, at any time of
//! day. The newest such session is resumed with its full history; when there
//! is none, exactly one new session is created.
//!
//! A resolver built with [`SessionResolver::with_credentials`] treats a missing
//! bearer token as "not signed in": it resolves to no session and does not
//! call the directory at all.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::auth::CredentialProvider;
use crate::directory::SessionDirectory;
use crate::error::{MoodchatError, Result};
use crate::models::{ChatSession, SessionSummary};

/// Whether `instant` falls on the same calendar day as `now`, in `now`'s zone.
pub fn is_same_local_day<Tz: TimeZone>(instant: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    instant.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

/// The newest active session created today.
///
/// Ties on `created_at` go to the entry listed last.
pub fn pick_today_session<'a, Tz: TimeZone>(
    sessions: &'a [SessionSummary],
    now: &DateTime<Tz>,
) -> Option<&'a SessionSummary> {
    sessions
        .iter()
        .filter(|s| s.is_active && is_same_local_day(&s.created_at, now))
        .max_by_key(|s| s.created_at)
}

/// Wrap a directory failure as a session error, keeping it if it already is one.
fn session_error(err: anyhow::Error, context: &str) -> anyhow::Error {
    match err.downcast_ref::<MoodchatError>() {
        Some(MoodchatError::Session(_)) => err,
        _ => MoodchatError::Session(format!("{}: {}", context, err)).into(),
    }
}

/// Finds or creates the session that receives new messages today.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    directory: Arc<dyn SessionDirectory>,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl SessionResolver {
    pub fn new(directory: Arc<dyn SessionDirectory>) -> Self {
        Self {
            directory,
            credentials: None,
        }
    }

    /// Gate every lookup on `credentials` yielding a token.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn directory(&self) -> &Arc<dyn SessionDirectory> {
        &self.directory
    }

    /// Whether a bearer token is available. Always `true` without a
    /// credential gate.
    ///
    /// # Errors
    ///
    /// [`MoodchatError::Credential`] when the credential source exists but
    /// cannot be read.
    pub fn signed_in(&self) -> Result<bool> {
        let Some(credentials) = &self.credentials else {
            return Ok(true);
        };
        let token = credentials.bearer_token().map_err(|e| match e.downcast::<MoodchatError>() {
            Ok(err @ MoodchatError::Credential(_)) => err,
            Ok(other) => MoodchatError::Credential(other.to_string()),
            Err(e) => MoodchatError::Credential(e.to_string()),
        })?;
        Ok(token.is_some())
    }

    /// Resume today's session for `user_id` or create one, using the local
    /// time zone. `Ok(None)` means no credential is available.
    ///
    /// # Errors
    ///
    /// Fails with [`MoodchatError::Session`] when any directory call fails.
    /// The caller decides whether to retry; there is no fallback session.
    pub async fn get_or_create_today_session(&self, user_id: &str) -> Result<Option<ChatSession>> {
        self.get_or_create_today_session_at(user_id, Local::now())
            .await
    }

    /// Same as [`Self::get_or_create_today_session`] with an explicit "now".
    pub async fn get_or_create_today_session_at<Tz>(
        &self,
        user_id: &str,
        now: DateTime<Tz>,
    ) -> Result<Option<ChatSession>>
    where
        Tz: TimeZone + Send + Sync,
        Tz::Offset: Send + Sync,
    {
        if !self.signed_in()? {
            tracing::info!(user_id, "No credential available; no session");
            return Ok(None);
        }

        let sessions = self
            .directory
            .list_sessions(user_id)
            .await
            .map_err(|e| session_error(e, "listing sessions failed"))?;

        if let Some(today) = pick_today_session(&sessions, &now) {
            tracing::info!(
                user_id,
                session_id = %today.session_id,
                candidates = sessions.len(),
                "Resuming today's chat session"
            );
            return self
                .directory
                .get_session(&today.session_id)
                .await
                .map(Some)
                .map_err(|e| session_error(e, "loading session history failed"));
        }

        tracing::info!(user_id, "No active session for today; creating one");
        self.directory
            .create_session(user_id)
            .await
            .map(Some)
            .map_err(|e| session_error(e, "creating session failed"))
    }

    /// All sessions of `user_id`, newest first. Empty when not signed in.
    pub async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        if !self.signed_in()? {
            return Ok(Vec::new());
        }
        let mut sessions = self
            .directory
            .list_sessions(user_id)
            .await
            .map_err(|e| session_error(e, "listing sessions failed"))?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    /// Delete today's active sessions and start a fresh one. `Ok(None)`
    /// when not signed in.
    pub async fn reset_today_session(&self, user_id: &str) -> Result<Option<ChatSession>> {
        if !self.signed_in()? {
            tracing::info!(user_id, "No credential available; nothing to reset");
            return Ok(None);
        }
        let now = Local::now();
        let sessions = self
            .directory
            .list_sessions(user_id)
            .await
            .map_err(|e| session_error(e, "listing sessions failed"))?;

        for session in sessions
            .iter()
            .filter(|s| s.is_active && is_same_local_day(&s.created_at, &now))
        {
            tracing::debug!(session_id = %session.session_id, "Deleting today's session for reset");
            self.directory
                .delete_session(&session.session_id)
                .await
                .map_err(|e| session_error(e, "deleting session failed"))?;
        }

        self.directory
            .create_session(user_id)
            .await
            .map(Some)
            .map_err(|e| session_error(e, "creating session failed"))
    }
}
