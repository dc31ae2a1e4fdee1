//! Command → handler table. Populated during setup, read-only afterwards.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::info;

use crate::request::BotRequest;

/// A conversation handler. Implemented for any `Fn(BotRequest) -> Future`,
/// so plain async fns register directly.
pub trait Handler: Send + Sync {
    fn call(&self, request: BotRequest) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Handler for F
where
    F: Fn(BotRequest) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, request: BotRequest) -> BoxFuture<'static, ()> {
        Box::pin(self(request))
    }
}

/// Static command routing table.
///
/// Commands are stored lowercased and looked up case-insensitively by exact
/// match. Registering the same command twice replaces the earlier handler.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl Router {
    /// Create an empty table with no registered commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `command`.
    pub fn register(&mut self, command: &str, handler: impl Handler + 'static) {
        let command = command.to_lowercase();
        info!(command = %command, "registered route");
        self.routes.insert(command, Arc::new(handler));
    }

    /// Find the handler for `command` (case-insensitive exact match).
    pub fn lookup(&self, command: &str) -> Option<Arc<dyn Handler>> {
        self.routes.get(&command.to_lowercase()).cloned()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut router = Router::new();
        router.register("Start", |_req: BotRequest| async {});

        assert!(router.lookup("start").is_some());
        assert!(router.lookup("START").is_some());
        assert!(router.lookup("stop").is_none());
    }

    #[test]
    fn reregistering_replaces() {
        let mut router = Router::new();
        router.register("echo", |_req: BotRequest| async {});
        router.register("echo", |_req: BotRequest| async {});
        assert_eq!(router.len(), 1);
    }
}
