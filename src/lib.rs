//! moodchat - chat session and streaming engine for the mood journal
//!
//! This library resolves the day's chat session, streams assistant replies
//! over Server-Sent Events, and keeps the reply state machine and the
//! outgoing message queue consistent while a reply is in flight.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `models`: sessions, messages, actions and diary references
//! - `directory`: the session directory collaborator (list/get/create/delete)
//! - `session`: today's-session resolution
//! - `transport`: SSE reply streams decoded into typed events
//! - `chat`: streaming state machine, message queue, store and engine
//! - `auth`: bearer credential providers
//! - `config`: configuration loading and validation
//! - `error`: error types and result aliases
//! - `cli` / `commands`: the command-line front end
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use moodchat::auth::provider_from_config;
//! use moodchat::chat::ChatEngine;
//! use moodchat::directory::HttpSessionDirectory;
//! use moodchat::session::SessionResolver;
//! use moodchat::transport::HttpStreamTransport;
//! use moodchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let credentials = provider_from_config(&config.auth);
//!     let directory = HttpSessionDirectory::new(&config.api, credentials.clone())?;
//!     let transport =
//!         HttpStreamTransport::new(&config.api, &config.stream, credentials.clone())?;
//!
//!     let resolver = SessionResolver::new(Arc::new(directory)).with_credentials(credentials);
//!     let mut engine = ChatEngine::new(Arc::new(transport));
//!     if engine.open_today(&resolver, "user-1").await?.is_none() {
//!         println!("not signed in");
//!         return Ok(());
//!     }
//!     engine.send_message("I had a long day").await?;
//!     engine.run_until_idle().await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod directory;
pub mod error;
pub mod logging;
pub mod models;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use chat::{ChatEngine, ChatStore};
pub use config::Config;
pub use error::{MoodchatError, Result};
pub use models::{ChatSession, Message};
pub use session::SessionResolver;
pub use transport::{StreamEvent, StreamTransport};
