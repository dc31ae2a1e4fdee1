//! Top-level facade: connect, register routes, drive updates.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, info};

use courier_core::config::{CourierConfig, ListenConfig, PollConfig};
use courier_core::{ChatId, CommandParser, IncomingMessage, MessageId, UserId};
use courier_dispatch::{Dispatcher, Handler, Router};

use crate::api::TelegramApi;
use crate::error::{Result, TelegramError};
use crate::outbound::TelegramSender;
use crate::types::{CallbackQuery, Update};
use crate::{poll, webhook};

/// A callback-query (inline keyboard press) handed to registered listeners.
#[derive(Clone)]
pub struct CallbackQueryRequest {
    pub query: CallbackQuery,
    pub api: Arc<TelegramApi>,
}

/// Listener for callback queries. Implemented for any
/// `Fn(CallbackQueryRequest) -> Future`.
pub trait CallbackListener: Send + Sync {
    fn call(&self, request: CallbackQueryRequest) -> BoxFuture<'static, ()>;
}

impl<F, Fut> CallbackListener for F
where
    F: Fn(CallbackQueryRequest) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, request: CallbackQueryRequest) -> BoxFuture<'static, ()> {
        Box::pin(self(request))
    }
}

/// The assembled bot: Bot API client + command routes + dispatch core.
///
/// Build with [`connect`](Self::connect), register routes, then hand control
/// to [`poll`](Self::poll) or [`listen`](Self::listen); both consume the
/// framework and run until the transport gives up.
pub struct BotFramework {
    api: Arc<TelegramApi>,
    parser: CommandParser,
    router: Router,
    callback_listeners: Vec<Arc<dyn CallbackListener>>,
    queue_capacity: usize,
}

impl BotFramework {
    /// Create the client, validate the token via `getMe`, and compile the
    /// command grammar from the bot's own username (needed to strip
    /// `/command@botname` mentions in group chats).
    pub async fn connect(config: &CourierConfig) -> Result<Self> {
        let api = Arc::new(TelegramApi::new(
            &config.telegram.bot_token,
            &config.telegram.api_base_url,
        ));

        let me = api.get_me().await?;
        let username = me
            .username
            .as_deref()
            .ok_or_else(|| TelegramError::Config("bot account has no username".to_string()))?;

        let parser = CommandParser::new(username)
            .map_err(|e| TelegramError::Config(e.to_string()))?;

        info!(username = %username, "connected to Bot API");

        Ok(Self {
            api,
            parser,
            router: Router::new(),
            callback_listeners: Vec::new(),
            queue_capacity: config.dispatch.queue_capacity,
        })
    }

    /// Register `handler` for `/command`.
    pub fn add_route(&mut self, command: &str, handler: impl Handler + 'static) {
        self.router.register(command, handler);
    }

    /// Register a listener invoked for every callback query.
    pub fn on_callback_query(&mut self, listener: impl CallbackListener + 'static) {
        self.callback_listeners.push(Arc::new(listener));
    }

    /// Drive updates via `getUpdates` long polling. Runs until the Bot API
    /// stays unreachable through the whole backoff schedule.
    pub async fn poll(self, config: &PollConfig) -> Result<()> {
        let config = config.clone();
        let api = Arc::clone(&self.api);
        let pipeline = Arc::new(self.into_pipeline());
        poll::run(pipeline, api, config).await
    }

    /// Serve updates via an HTTP webhook listener. TLS termination and the
    /// `setWebhook` registration belong to the deployment, not the process.
    pub async fn listen(self, config: &ListenConfig) -> Result<()> {
        let config = config.clone();
        let pipeline = Arc::new(self.into_pipeline());
        webhook::run(pipeline, config).await
    }

    fn into_pipeline(self) -> UpdatePipeline {
        let sender = Arc::new(TelegramSender::new(Arc::clone(&self.api)));
        let dispatcher = Dispatcher::new(self.parser, self.router, sender, self.queue_capacity);
        UpdatePipeline {
            dispatcher,
            api: self.api,
            callback_listeners: self.callback_listeners,
        }
    }
}

/// Routes decoded updates to the dispatcher or the callback listeners.
/// Shared by both transports.
pub(crate) struct UpdatePipeline {
    dispatcher: Dispatcher,
    api: Arc<TelegramApi>,
    callback_listeners: Vec<Arc<dyn CallbackListener>>,
}

impl UpdatePipeline {
    pub(crate) async fn process(&self, update: Update) {
        if let Some(message) = update.message {
            let from = match message.from {
                Some(ref from) if !from.is_bot => from,
                // No sender (channel posts) or another bot: nothing to
                // dispatch a conversation for.
                _ => return,
            };
            let text = match message.text {
                Some(ref text) if !text.is_empty() => text.clone(),
                _ => return,
            };

            let incoming = IncomingMessage {
                chat: ChatId(message.chat.id),
                sender: UserId(from.id),
                message_id: MessageId(message.message_id),
                text,
                sender_name: from.username.clone().or_else(|| Some(from.first_name.clone())),
            };
            self.dispatcher.dispatch(incoming).await;
        } else if let Some(query) = update.callback_query {
            debug!(query_id = %query.id, "callback query");
            for listener in &self.callback_listeners {
                listener
                    .call(CallbackQueryRequest {
                        query: query.clone(),
                        api: Arc::clone(&self.api),
                    })
                    .await;
            }
        }
    }
}
