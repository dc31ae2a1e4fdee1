//! Telegram transport for the Courier dispatch core.
//!
//! Wraps the Bot API behind a reqwest client, feeds incoming updates into a
//! [`courier_dispatch::Dispatcher`], and exposes the whole thing as a small
//! [`BotFramework`] facade: connect, register routes, then drive updates via
//! long polling or a webhook listener.

pub mod api;
pub mod error;
pub mod framework;
pub mod outbound;
pub mod types;

mod poll;
mod webhook;

pub use api::TelegramApi;
pub use error::TelegramError;
pub use framework::{BotFramework, CallbackQueryRequest};
pub use outbound::TelegramSender;

// The handler-facing surface lives in courier-dispatch; re-exported so bot
// code only needs this crate.
pub use courier_dispatch::{BotRequest, DispatchError};
