//! Entry point for incoming messages: classify, enqueue, spawn workers.

use std::sync::Arc;

use tracing::{debug, warn};

use courier_core::{CommandParser, ConversationKey, IncomingMessage, ReplySender};

use crate::mailbox::MailboxReader;
use crate::registry::{EnqueueOutcome, SessionRegistry};
use crate::request::BotRequest;
use crate::router::Router;
use crate::worker;

/// Routes each incoming message into its conversation.
///
/// A message either continues a live conversation (enqueued into the
/// existing mailbox, picked up by that conversation's worker or a handler
/// suspended in `wait_next`) or starts a new one (fresh mailbox plus a
/// spawned worker). The dispatcher never runs a handler itself, so dispatch
/// latency stays independent of handler execution time.
pub struct Dispatcher {
    parser: CommandParser,
    router: Arc<Router>,
    registry: Arc<SessionRegistry>,
    outbound: Arc<dyn ReplySender>,
}

impl Dispatcher {
    pub fn new(
        parser: CommandParser,
        router: Router,
        outbound: Arc<dyn ReplySender>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            parser,
            router: Arc::new(router),
            registry: Arc::new(SessionRegistry::new(queue_capacity)),
            outbound,
        }
    }

    /// Handle one delivered message. Called once per message, concurrently
    /// across conversations; calls for the same conversation must arrive in
    /// transport order and are enqueued in that order.
    pub async fn dispatch(&self, message: IncomingMessage) {
        let parsed = self.parser.parse(&message.text);
        let key = message.conversation_key();
        debug!(key = %key, command = ?parsed.as_ref().map(|(c, _)| c), "dispatching");

        let (reader, created) = self.registry.lookup_or_create(&key).await;
        let request = self.build_request(&message, &parsed, &key, &reader);

        if created {
            if request.command.is_none() {
                // Bare non-command text never starts a conversation: drop
                // the request and retire the entry we just created. If a
                // concurrent dispatch already queued into it, the
                // conversation is live and needs its worker after all.
                if !self.registry.remove_if_empty(&key).await {
                    self.spawn_worker(reader, key);
                }
                return;
            }
            if self.registry.enqueue(&key, request).await {
                self.spawn_worker(reader, key);
            } else {
                warn!(key = %key, "fresh session vanished before first enqueue");
            }
            return;
        }

        if self.registry.enqueue(&key, request.clone()).await {
            return;
        }

        // The conversation tore down between lookup and enqueue. Retry once,
        // atomically this time: the message lands in the surviving queue or
        // a fresh conversation starts. Bare text whose session vanished is
        // dropped like any other bare text.
        debug!(key = %key, "enqueue raced with teardown, retrying");
        match self.registry.enqueue_or_create(&key, request).await {
            EnqueueOutcome::Started(reader) => self.spawn_worker(reader, key),
            EnqueueOutcome::Enqueued | EnqueueOutcome::Discarded => {}
        }
    }

    /// The routing table in use, shared with every worker.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// The live-conversation table.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    fn build_request(
        &self,
        message: &IncomingMessage,
        parsed: &Option<(String, String)>,
        key: &ConversationKey,
        reader: &MailboxReader,
    ) -> BotRequest {
        let (command, args) = match parsed {
            Some((command, args)) => (Some(command.clone()), args.clone()),
            None => (None, String::new()),
        };
        BotRequest {
            message: message.clone(),
            command,
            args,
            key: key.clone(),
            mailbox: reader.clone(),
            outbound: Arc::clone(&self.outbound),
        }
    }

    fn spawn_worker(&self, reader: MailboxReader, key: ConversationKey) {
        tokio::spawn(worker::run(
            Arc::clone(&self.registry),
            Arc::clone(&self.router),
            reader,
            key,
        ));
    }
}
