//! Shared table of live conversations.
//!
//! Every mutation (entry creation, enqueue, and the final check-and-remove)
//! runs under one lock. Holding the lock across the enqueue is what makes
//! teardown safe: `remove_if_empty` can never interleave with a concurrent
//! push, so a message observed as "not there yet" is either already in the
//! mailbox when the entry is checked, or arrives after the entry is gone and
//! gets a fresh conversation via the dispatcher's retry.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::debug;

use courier_core::config::DEFAULT_QUEUE_CAPACITY;
use courier_core::ConversationKey;

use crate::mailbox::{mailbox, MailboxReader, MailboxSender};
use crate::request::BotRequest;

struct SessionEntry {
    tx: MailboxSender,
    reader: MailboxReader,
}

/// Result of [`SessionRegistry::enqueue_or_create`].
pub enum EnqueueOutcome {
    /// The request landed in an existing mailbox.
    Enqueued,
    /// A fresh entry was created and the request is its first message; the
    /// caller must spawn the conversation worker.
    Started(MailboxReader),
    /// The key was absent and the request carried no command, so no
    /// conversation was started.
    Discarded,
}

/// Maps each live conversation to its mailbox.
///
/// A key is present iff its conversation has a worker draining it or a
/// message the worker has not yet observed. Entries are never reused: a
/// conversation that re-starts after teardown gets a fresh mailbox.
pub struct SessionRegistry {
    capacity: usize,
    table: Mutex<HashMap<ConversationKey, SessionEntry>>,
}

impl SessionRegistry {
    /// Create an empty registry whose mailboxes hold up to `capacity`
    /// pending requests each. A mailbox must fit at least the conversation's
    /// first message, so zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Return the mailbox reader for `key`, creating the entry when absent.
    ///
    /// The `bool` is `true` when this call created the entry; the caller is
    /// then responsible for either spawning the conversation worker or
    /// retiring the entry again.
    pub async fn lookup_or_create(&self, key: &ConversationKey) -> (MailboxReader, bool) {
        let mut table = self.table.lock().await;
        if let Some(entry) = table.get(key) {
            return (entry.reader.clone(), false);
        }

        let (tx, reader) = mailbox(self.capacity);
        table.insert(
            key.clone(),
            SessionEntry {
                tx,
                reader: reader.clone(),
            },
        );
        debug!(key = %key, "session created");
        (reader, true)
    }

    /// Push `request` into the mailbox for `key`.
    ///
    /// Returns `false` without side effects when the key is absent (the
    /// conversation tore down since the caller looked it up). The request's
    /// mailbox handle is re-pointed at the entry it lands in, so `wait_next`
    /// always reads the queue the message actually joined. The push happens
    /// under the registry lock and suspends while the mailbox is full;
    /// this is the one point where transport backpressure appears.
    pub async fn enqueue(&self, key: &ConversationKey, mut request: BotRequest) -> bool {
        let table = self.table.lock().await;
        match table.get(key) {
            Some(entry) => {
                request.mailbox = entry.reader.clone();
                entry.tx.send(request).await
            }
            None => false,
        }
    }

    /// Atomic enqueue-into-existing or create-and-enqueue, in one critical
    /// section. Used by the dispatcher after an [`enqueue`](Self::enqueue)
    /// lost the race with teardown: unlike lookup-then-enqueue, this cannot
    /// race a second teardown, so the request is never lost. A request with
    /// no command finds no entry to continue and is discarded: bare text
    /// does not start conversations.
    pub async fn enqueue_or_create(
        &self,
        key: &ConversationKey,
        mut request: BotRequest,
    ) -> EnqueueOutcome {
        let mut table = self.table.lock().await;

        if let Some(entry) = table.get(key) {
            request.mailbox = entry.reader.clone();
            if entry.tx.send(request).await {
                return EnqueueOutcome::Enqueued;
            }
            // Reader side is gone but the entry survived; not reachable
            // through the worker lifecycle. Drop the husk.
            table.remove(key);
            return EnqueueOutcome::Discarded;
        }

        if request.command.is_none() {
            return EnqueueOutcome::Discarded;
        }

        let (tx, reader) = mailbox(self.capacity);
        request.mailbox = reader.clone();
        // Fresh mailbox with capacity >= 1: the send completes immediately.
        tx.send(request).await;
        table.insert(
            key.clone(),
            SessionEntry {
                tx,
                reader: reader.clone(),
            },
        );
        debug!(key = %key, "session re-created after teardown race");
        EnqueueOutcome::Started(reader)
    }

    /// Remove the entry for `key` if its mailbox has no immediately
    /// available message; returns `true` when the entry is gone (removed
    /// now, or already absent).
    ///
    /// The emptiness check and the removal share one critical section with
    /// `enqueue`, so an arrival that slips in just before the check is seen
    /// (`false`, the caller keeps draining) and one that arrives after the
    /// removal finds no entry and is re-dispatched as a new conversation.
    pub async fn remove_if_empty(&self, key: &ConversationKey) -> bool {
        let mut table = self.table.lock().await;
        let empty = match table.get(key) {
            Some(entry) => entry.reader.is_empty().await,
            None => return true,
        };

        if empty {
            table.remove(key);
            debug!(key = %key, "session removed");
        }
        empty
    }

    /// Whether `key` currently has a live entry.
    pub async fn contains(&self, key: &ConversationKey) -> bool {
        self.table.lock().await.contains_key(key)
    }

    /// Number of live conversations.
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.lock().await.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
