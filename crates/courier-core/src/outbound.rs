use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatId, MessageId};

/// Formatting hint for outbound message text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyFormat {
    /// Raw text with no special markup.
    #[default]
    Plain,

    /// Markdown as understood by the target platform.
    Markdown,
}

/// Outbound side of a transport: delivers replies and chat actions.
///
/// Implementations must be `Send + Sync` so a single sender can be shared
/// across every conversation worker behind an `Arc`. The dispatch core never
/// calls this trait itself; it only threads the sender through to handlers,
/// which use the reply helpers on their request object.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send `text` to `chat`, optionally as a threaded reply to `reply_to`.
    ///
    /// Returns the platform id of the sent message.
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        format: ReplyFormat,
    ) -> Result<MessageId>;

    /// Show a "typing…" indicator in `chat`.
    async fn send_typing(&self, chat: ChatId) -> Result<()>;
}
