//! Chat core: streaming state machine, outgoing queue, store and engine
//!
//! # Module Layout
//!
//! - [`state`]  -- the reply-in-flight state machine
//! - [`queue`]  -- FIFO of messages typed while a reply streams
//! - [`store`]  -- synchronous owner of session, history, queue and state
//! - [`engine`] -- async single writer wiring the store to the transport

pub mod engine;
pub mod queue;
pub mod state;
pub mod store;

pub use engine::{ChatCommand, ChatEngine, ChatStatus, ChatUpdate};
pub use queue::MessageQueue;
pub use state::{SettledReply, StreamPhase, StreamingState};
pub use store::{ChatStore, SendDecision};
