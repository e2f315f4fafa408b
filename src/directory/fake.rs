//! In-memory session directory for unit tests
//!
//! Records how many list/get/create/delete calls were made so tests can
//! assert on the resolver's side effects, and can be switched into a failing
//! mode to exercise error propagation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::directory::SessionDirectory;
use crate::error::{MoodchatError, Result};
use crate::models::{ChatSession, Message, SessionSummary};

#[derive(Debug, Default)]
pub struct FakeSessionDirectory {
    sessions: Mutex<Vec<ChatSession>>,
    fail: AtomicBool,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl FakeSessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session; returns its id.
    pub fn insert(
        &self,
        user_id: &str,
        created_at: DateTime<Utc>,
        is_active: bool,
        messages: Vec<Message>,
    ) -> String {
        let id = format!("seed-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.sessions.lock().unwrap().push(ChatSession {
            session_id: id.clone(),
            user_id: user_id.to_string(),
            title: String::new(),
            summary: None,
            created_at,
            updated_at: created_at,
            is_active,
            messages,
        });
        id
    }

    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.session_id.clone())
            .collect()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MoodchatError::Session("directory unavailable".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl SessionDirectory for FakeSessionDirectory {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| SessionSummary {
                session_id: s.session_id.clone(),
                user_id: s.user_id.clone(),
                title: s.title.clone(),
                summary: s.summary.clone(),
                created_at: s.created_at,
                updated_at: s.updated_at,
                is_active: s.is_active,
                message_count: Some(s.messages.len()),
            })
            .collect())
    }

    async fn get_session(&self, session_id: &str) -> Result<ChatSession> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
            .ok_or_else(|| MoodchatError::Session(format!("no session {}", session_id)).into())
    }

    async fn create_session(&self, user_id: &str) -> Result<ChatSession> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let now = Utc::now();
        let session = ChatSession {
            session_id: format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            user_id: user_id.to_string(),
            title: String::new(),
            summary: None,
            created_at: now,
            updated_at: now,
            is_active: true,
            messages: Vec::new(),
        };
        self.sessions.lock().unwrap().push(session.clone());
        Ok(session)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.sessions
            .lock()
            .unwrap()
            .retain(|s| s.session_id != session_id);
        Ok(())
    }
}
