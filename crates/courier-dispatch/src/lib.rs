//! Session-dispatch core: partitions an incoming message stream into
//! per-conversation mailboxes, runs one worker per active conversation, and
//! lets handlers suspend on the next message of their own conversation.

pub mod dispatcher;
pub mod error;
pub mod mailbox;
pub mod registry;
pub mod request;
pub mod router;

mod worker;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use registry::{EnqueueOutcome, SessionRegistry};
pub use request::BotRequest;
pub use router::{Handler, Router};
