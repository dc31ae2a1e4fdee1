pub mod config;
pub mod error;
pub mod outbound;
pub mod parse;
pub mod types;

pub use error::{CourierError, Result};
pub use outbound::{ReplyFormat, ReplySender};
pub use parse::CommandParser;
pub use types::{ChatId, ConversationKey, IncomingMessage, MessageId, UserId};
