use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-native chat identifier (negative for group chats on Telegram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Platform-native sender identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Platform-native message identifier, echoed back for threaded replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Identifies one conversation: a (chat, sender) pair.
///
/// Format: `{chat_id}:{user_id}`. Two messages map to the same key iff they
/// share both chat and sender, so each private chat, and each user inside a
/// group chat, gets its own conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Derive the key for a (chat, sender) pair. Pure and deterministic.
    pub fn new(chat: ChatId, sender: UserId) -> Self {
        Self(format!("{}:{}", chat, sender))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A raw message delivered by the transport, before command parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub chat: ChatId,
    pub sender: UserId,
    pub message_id: MessageId,
    /// Free-form message text. Never empty: transports drop text-less updates.
    pub text: String,
    /// Display name of the sender, when the platform provides one.
    pub sender_name: Option<String>,
}

impl IncomingMessage {
    /// The conversation this message belongs to.
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(self.chat, self.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_same_pair_is_equal() {
        let a = ConversationKey::new(ChatId(1), UserId(7));
        let b = ConversationKey::new(ChatId(1), UserId(7));
        assert_eq!(a, b);
    }

    #[test]
    fn key_differs_by_chat_and_sender() {
        let base = ConversationKey::new(ChatId(1), UserId(7));
        assert_ne!(base, ConversationKey::new(ChatId(2), UserId(7)));
        assert_ne!(base, ConversationKey::new(ChatId(1), UserId(8)));
    }

    #[test]
    fn key_format_handles_negative_group_ids() {
        let key = ConversationKey::new(ChatId(-100_123_456), UserId(42));
        assert_eq!(key.as_str(), "-100123456:42");
    }
}
