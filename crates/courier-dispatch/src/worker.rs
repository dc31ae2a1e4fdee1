//! Per-conversation worker: drains the session mailbox, invokes route
//! handlers, and retires the registry entry once the queue runs dry.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{debug, warn};

use courier_core::ConversationKey;

use crate::mailbox::MailboxReader;
use crate::registry::SessionRegistry;
use crate::router::Router;

/// Drive one conversation until its mailbox is observed empty under the
/// registry lock. Exactly one instance runs per live key.
pub(crate) async fn run(
    registry: Arc<SessionRegistry>,
    router: Arc<Router>,
    reader: MailboxReader,
    key: ConversationKey,
) {
    debug!(key = %key, "worker started");

    loop {
        match reader.try_next().await {
            Some(request) => {
                let handler = request
                    .command
                    .as_deref()
                    .and_then(|command| router.lookup(command));

                match handler {
                    Some(handler) => {
                        let command = request.command.clone();
                        // A panicking handler aborts only its own message;
                        // the worker must keep going so the drain-and-remove
                        // step below runs on every exit path.
                        if let Err(_panic) =
                            AssertUnwindSafe(handler.call(request)).catch_unwind().await
                        {
                            warn!(key = %key, command = ?command, "handler panicked");
                        }
                    }
                    None => {
                        // Parse mismatch or unregistered command: consumed
                        // silently, not an error.
                        debug!(key = %key, command = ?request.command, "no route, message dropped");
                    }
                }
            }
            None => {
                if registry.remove_if_empty(&key).await {
                    debug!(key = %key, "worker stopped");
                    return;
                }
                // A message slipped in between our empty observation and the
                // locked re-check. Keep draining.
            }
        }
    }
}
