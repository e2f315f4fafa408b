//! Error types for moodchat
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for moodchat operations
///
/// Session failures are surfaced to callers. Transport and protocol
/// failures are absorbed by the chat engine into the streaming `error`
/// field, so they mostly appear as text on [`crate::transport::StreamEvent::Error`].
#[derive(Error, Debug)]
pub enum MoodchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session directory list/get/create/delete failures
    #[error("Session error: {0}")]
    Session(String),

    /// Network failure while opening or reading a reply stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed or unframed event data on the reply stream
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Outgoing message rejected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// `send_message` called before a session was resolved
    #[error("No active chat session; resolve today's session first")]
    NoActiveSession,

    /// Credential lookup failures (unreadable auth file, etc.)
    #[error("Credential error: {0}")]
    Credential(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for moodchat operations
///
/// Uses `anyhow::Error` so callers get context chains; the typed
/// [`MoodchatError`] is recovered with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
