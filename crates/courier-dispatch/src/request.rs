//! The request object handed to conversation handlers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use courier_core::{
    ChatId, ConversationKey, IncomingMessage, MessageId, ReplyFormat, ReplySender, UserId,
};

use crate::error::{DispatchError, Result};
use crate::mailbox::MailboxReader;

/// One incoming message plus everything a handler needs to act on it:
/// the parsed command, the conversation key, a handle to the conversation's
/// own mailbox (for `wait_next`), and the outbound transport (for replies).
#[derive(Clone)]
pub struct BotRequest {
    pub message: IncomingMessage,

    /// Lowercased command word, `None` when the text did not match the
    /// command grammar. Continuation messages in an established
    /// conversation routinely carry `None`; they are consumed by
    /// `wait_next`, not by the route table.
    pub command: Option<String>,

    /// Argument text after the command word, trimmed. Empty for bare
    /// commands and non-command messages.
    pub args: String,

    /// The conversation this request belongs to. Carried rather than
    /// recomputed so `wait_next` and the dispatcher always agree on which
    /// mailbox is meant.
    pub key: ConversationKey,

    pub(crate) mailbox: MailboxReader,
    pub(crate) outbound: Arc<dyn ReplySender>,
}

impl BotRequest {
    /// Suspend until the next message of this conversation arrives and
    /// return it.
    ///
    /// While suspended here the conversation worker is parked inside the
    /// current handler call, so the message is delivered straight to this
    /// wait and never starts a second handler.
    pub async fn wait_next(&self) -> Result<BotRequest> {
        self.mailbox.next().await.ok_or(DispatchError::SessionClosed)
    }

    /// Like [`wait_next`](Self::wait_next), but give up after `timeout`.
    ///
    /// Expiry returns [`DispatchError::WaitTimeout`] exactly once and does
    /// not consume the eventual message.
    pub async fn wait_next_timeout(&self, timeout: Duration) -> Result<BotRequest> {
        self.mailbox.next_timeout(timeout).await
    }

    /// Send `text` as a threaded reply to the origin message.
    pub async fn quick_reply(&self, text: &str) -> Result<MessageId> {
        let id = self
            .outbound
            .send_text(self.chat(), text, Some(self.message.message_id), ReplyFormat::Plain)
            .await?;
        Ok(id)
    }

    /// Send Markdown `text` as a threaded reply to the origin message.
    pub async fn quick_reply_md(&self, text: &str) -> Result<MessageId> {
        let id = self
            .outbound
            .send_text(self.chat(), text, Some(self.message.message_id), ReplyFormat::Markdown)
            .await?;
        Ok(id)
    }

    /// Show a "typing…" indicator in the origin chat.
    pub async fn send_typing(&self) -> Result<()> {
        self.outbound.send_typing(self.chat()).await?;
        Ok(())
    }

    pub fn chat(&self) -> ChatId {
        self.message.chat
    }

    pub fn sender(&self) -> UserId {
        self.message.sender
    }

    pub fn text(&self) -> &str {
        &self.message.text
    }
}

impl fmt::Debug for BotRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotRequest")
            .field("message", &self.message)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
