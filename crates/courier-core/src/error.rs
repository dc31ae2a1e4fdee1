use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Command pattern error: {0}")]
    Pattern(String),

    #[error("Outbound delivery failed: {0}")]
    Outbound(String),
}

pub type Result<T> = std::result::Result<T, CourierError>;
