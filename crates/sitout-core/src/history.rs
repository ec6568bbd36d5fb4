//! Bounded conversation history with FIFO eviction.

use std::collections::VecDeque;

use serde::Serialize;

use crate::types::Message;

/// Default number of messages retained.
pub const DEFAULT_RETENTION: usize = 10;

/// Ordered, bounded sequence of messages. Oldest entries are dropped first.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationHistory {
    messages: VecDeque<Message>,
    #[serde(skip)]
    retention: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl ConversationHistory {
    /// A retention of 0 is treated as 1.
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            messages: VecDeque::with_capacity(retention),
            retention,
        }
    }

    /// Append a message, evicting the oldest entries past the bound.
    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.retention {
            self.messages.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.back()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    /// The most recent `k` messages, oldest first.
    pub fn recent(&self, k: usize) -> impl Iterator<Item = &Message> {
        let skip = self.messages.len().saturating_sub(k);
        self.messages.iter().skip(skip)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}
