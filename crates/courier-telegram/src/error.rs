use thiserror::Error;

/// Errors produced by the Telegram transport.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false` or a non-2xx status.
    #[error("Bot API error (status {status}): {description}")]
    Api { status: u16, description: String },

    #[error("Malformed Bot API response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TelegramError>;
