use thiserror::Error;

/// Errors surfaced to conversation handlers.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// `wait_next_timeout` expired before the next message arrived. The
    /// message itself is not consumed; it stays queued for the worker or a
    /// later wait.
    #[error("No message arrived within {ms}ms")]
    WaitTimeout { ms: u64 },

    /// The session mailbox was closed underneath a waiting handler. Not
    /// reachable while the single-worker lifecycle holds; kept so the recv
    /// path has no panic branch.
    #[error("Session mailbox closed")]
    SessionClosed,

    /// A reply helper failed in the outbound transport.
    #[error(transparent)]
    Outbound(#[from] courier_core::CourierError),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
