//! Per-conversation mailbox: a bounded FIFO of pending requests.
//!
//! The sender half lives in the [`SessionRegistry`](crate::registry) entry;
//! the receiver half is shared between the conversation worker and any
//! handler suspended in `wait_next`. Both drain the same queue, and the
//! worker only polls it while no handler is in flight, so reads are already
//! serialized; the inner mutex makes that sharing expressible.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::error::{DispatchError, Result};
use crate::request::BotRequest;

/// Create a mailbox pair with the given capacity bound.
pub(crate) fn mailbox(capacity: usize) -> (MailboxSender, MailboxReader) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        MailboxSender(tx),
        MailboxReader {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Enqueue half of a session mailbox. Held only by the registry entry, so
/// dropping the entry closes the queue.
pub(crate) struct MailboxSender(mpsc::Sender<BotRequest>);

impl MailboxSender {
    /// Push a request, suspending while the mailbox is at capacity.
    ///
    /// Returns `false` if the reader side is gone.
    pub(crate) async fn send(&self, request: BotRequest) -> bool {
        self.0.send(request).await.is_ok()
    }
}

/// Dequeue half of a session mailbox.
#[derive(Clone)]
pub struct MailboxReader {
    inner: Arc<Mutex<mpsc::Receiver<BotRequest>>>,
}

impl MailboxReader {
    /// Dequeue the next request, suspending until one arrives. `None` when
    /// the sender half has been dropped.
    pub(crate) async fn next(&self) -> Option<BotRequest> {
        self.inner.lock().await.recv().await
    }

    /// Dequeue the next request, suspending up to `timeout`.
    ///
    /// Expiry cancels the pending receive without consuming anything: a
    /// message that arrives later is delivered to the next read.
    pub(crate) async fn next_timeout(&self, timeout: Duration) -> Result<BotRequest> {
        match tokio::time::timeout(timeout, self.next()).await {
            Ok(Some(request)) => Ok(request),
            Ok(None) => Err(DispatchError::SessionClosed),
            Err(_elapsed) => Err(DispatchError::WaitTimeout {
                ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Dequeue a request only if one is immediately available.
    pub(crate) async fn try_next(&self) -> Option<BotRequest> {
        self.inner.lock().await.try_recv().ok()
    }

    /// True when no request is immediately available.
    ///
    /// Only meaningful while the caller holds the registry lock; otherwise
    /// a concurrent enqueue can invalidate the answer before it is used.
    pub(crate) async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
