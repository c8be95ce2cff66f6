//! History compaction.
//!
//! Bounds the conversation carried into a turn, first by message count and
//! then by a character budget counted from the newest message backwards.
//! Messages are kept or dropped whole, never truncated.

use minijira_core::message::{Conversation, Message};

/// Keep the newest messages of `history` within both bounds.
///
/// The result is a suffix of `history` in its original order. A newest
/// message longer than `max_chars` on its own yields an empty result.
pub fn compact(history: &[Message], max_window: usize, max_chars: usize) -> Vec<Message> {
    let window = &history[history.len().saturating_sub(max_window)..];

    let mut total = 0usize;
    let kept = window
        .iter()
        .rev()
        .take_while(|m| {
            total += m.char_len();
            total <= max_chars
        })
        .count();

    window[window.len() - kept..].to_vec()
}

/// The two bounds applied before every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub max_window: usize,
    pub max_chars: usize,
}

impl HistoryLimits {
    pub fn new(max_window: usize, max_chars: usize) -> Self {
        Self {
            max_window,
            max_chars,
        }
    }

    pub fn apply(&self, conversation: &Conversation) -> Conversation {
        compact(conversation.messages(), self.max_window, self.max_chars).into()
    }
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self::new(12, 6000)
    }
}
