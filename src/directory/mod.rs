//! Session directory collaborator
//!
//! The directory owns persisted sessions; the chat engine only lists,
//! fetches, creates and deletes them. [`http::HttpSessionDirectory`] talks
//! to the journal backend; [`fake::FakeSessionDirectory`] is an in-memory
//! stand-in used in tests (cfg(test) only).
//!
//! Every method fails with [`crate::error::MoodchatError::Session`].

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChatSession, SessionSummary};

/// List/get/create/delete endpoints for chat sessions.
#[async_trait]
pub trait SessionDirectory: Send + Sync + std::fmt::Debug {
    /// All sessions belonging to `user_id`, without message history.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>>;

    /// One session with its full message history.
    async fn get_session(&self, session_id: &str) -> Result<ChatSession>;

    /// Create an empty session for `user_id`.
    async fn create_session(&self, user_id: &str) -> Result<ChatSession>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

pub mod http;

#[cfg(test)]
pub mod fake;

pub use http::HttpSessionDirectory;
