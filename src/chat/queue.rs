//! FIFO of user messages submitted while a reply is streaming.

use std::collections::VecDeque;

use crate::models::QueuedMessage;

/// Outgoing messages waiting for the current reply to settle.
///
/// Strictly first-in first-out: no dedup, no merging, no cap.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    items: VecDeque<QueuedMessage>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the tail; returns the new length.
    pub fn push(&mut self, message: QueuedMessage) -> usize {
        self.items.push_back(message);
        self.items.len()
    }

    pub fn pop(&mut self) -> Option<QueuedMessage> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedMessage> {
        self.items.iter()
    }

    /// Drop everything; returns how many messages were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.items.len();
        self.items.clear();
        dropped
    }
}
