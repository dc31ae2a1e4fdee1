//! `ReplySender` implementation backed by the Bot API client.

use std::sync::Arc;

use async_trait::async_trait;

use courier_core::{ChatId, CourierError, MessageId, ReplyFormat, ReplySender};

use crate::api::{SendMessage, TelegramApi};

/// Shared outbound half handed to every conversation handler.
pub struct TelegramSender {
    api: Arc<TelegramApi>,
}

impl TelegramSender {
    pub fn new(api: Arc<TelegramApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
        format: ReplyFormat,
    ) -> courier_core::Result<MessageId> {
        let request = SendMessage {
            chat_id: chat.0,
            text: text.to_string(),
            reply_to_message_id: reply_to.map(|id| id.0),
            parse_mode: match format {
                ReplyFormat::Plain => None,
                ReplyFormat::Markdown => Some("Markdown".to_string()),
            },
        };

        let sent = self
            .api
            .send_message(&request)
            .await
            .map_err(|e| CourierError::Outbound(e.to_string()))?;
        Ok(MessageId(sent.message_id))
    }

    async fn send_typing(&self, chat: ChatId) -> courier_core::Result<()> {
        self.api
            .send_chat_action(chat.0, "typing")
            .await
            .map_err(|e| CourierError::Outbound(e.to_string()))?;
        Ok(())
    }
}
