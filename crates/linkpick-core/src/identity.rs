//! Conversation identity types.

use std::fmt;

/// Transport-agnostic conversation identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ConversationId(i64);

impl ConversationId {
    /// Return the raw `i64` value for this conversation.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for ConversationId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
