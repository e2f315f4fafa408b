//! Data models for chat sessions and messages.
//!
//! These types double as the wire format of the session directory
//! endpoints. Field names are snake_case on output; the camelCase spellings
//! the web client used are accepted on input.

mod message;
mod session;
pub(crate) mod timestamp;

pub use message::{ActionType, DiaryReference, Message, MessageAction, MessageRole, QueuedMessage};
pub use session::{ChatSession, SessionSummary};
