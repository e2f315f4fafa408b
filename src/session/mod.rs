//! Session resolution: which session receives today's messages.

pub mod resolver;

pub use resolver::{is_same_local_day, pick_today_session, SessionResolver};
