//! Thin reqwest client for the Telegram Bot API.
//!
//! Every method POSTs JSON to `{base_url}/bot{token}/{method}` and unwraps
//! the standard `{ok, result, description}` envelope.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TelegramError};
use crate::types::{Message, Update, User};

/// Extra seconds on top of the long-poll hold time before the HTTP request
/// itself is considered dead.
const LONG_POLL_GRACE_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramApi {
    pub fn new(token: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Validate the token and fetch the bot's own identity.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates with id >= `offset`.
    ///
    /// Holds the request open up to `timeout_secs` server-side; an empty
    /// `allowed_updates` keeps the platform's default update set.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
        allowed_updates: &[String],
    ) -> Result<Vec<Update>> {
        let mut body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
        });
        if !allowed_updates.is_empty() {
            body["allowed_updates"] = serde_json::json!(allowed_updates);
        }

        let http_timeout = Duration::from_secs(timeout_secs + LONG_POLL_GRACE_SECS);
        self.call("getUpdates", &body, Some(http_timeout)).await
    }

    /// Send a text message; returns the message as echoed by the platform.
    pub async fn send_message(&self, request: &SendMessage) -> Result<Message> {
        self.call("sendMessage", request, None).await
    }

    /// Show a chat action ("typing", "upload_photo", …) in `chat_id`.
    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<bool> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": action,
        });
        self.call("sendChatAction", &body, None).await
    }

    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        debug!(method, "Bot API call");

        let mut builder = self.client.post(&url).json(body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        // The Bot API reports failures inside the envelope (with a matching
        // non-2xx status), so parse the envelope first and fall back to the
        // raw body for anything that is not even JSON.
        let envelope: ApiEnvelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if status >= 400 => {
                return Err(TelegramError::Api {
                    status,
                    description: text,
                })
            }
            Err(e) => return Err(TelegramError::InvalidResponse(e.to_string())),
        };

        if !envelope.ok {
            return Err(TelegramError::Api {
                status,
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::InvalidResponse("ok response without result".to_string()))
    }
}
