use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Pending messages buffered per conversation before enqueue applies
/// backpressure to the transport.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Long-poll hold time requested from the Bot API.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LISTEN_PORT: u16 = 8443;
pub const DEFAULT_LISTEN_BIND: &str = "0.0.0.0";

/// Top-level config (courier.toml + COURIER_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

/// Long-polling transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds to sleep after a batch that contained no updates.
    #[serde(default)]
    pub delay_secs: u64,
    /// Long-poll hold time passed to `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
    /// Update kinds to subscribe to. Empty = platform default set.
    #[serde(default)]
    pub allowed_updates: Vec<String>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay_secs: 0,
            timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            allowed_updates: Vec::new(),
        }
    }
}

/// Webhook transport configuration.
///
/// The listener serves plain HTTP. TLS termination belongs to a fronting
/// proxy, which is also where Telegram's webhook certificate requirements
/// are met.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_listen_bind")]
    pub bind: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_updates: Vec<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_LISTEN_BIND.to_string(),
            port: DEFAULT_LISTEN_PORT,
            allowed_updates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-conversation mailbox capacity.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}
fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT_SECS
}
fn default_listen_bind() -> String {
    DEFAULT_LISTEN_BIND.to_string()
}
fn default_listen_port() -> u16 {
    DEFAULT_LISTEN_PORT
}
fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl CourierConfig {
    /// Load config from a TOML file with COURIER_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./courier.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("courier.toml");

        let config: CourierConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("COURIER_").split("_"))
            .extract()
            .map_err(|e| crate::error::CourierError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: CourierConfig = Figment::new()
            .merge(Toml::string(
                r#"
                [telegram]
                bot_token = "123:abc"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
        assert_eq!(config.poll.timeout_secs, DEFAULT_POLL_TIMEOUT_SECS);
        assert_eq!(config.dispatch.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: CourierConfig = Figment::new()
            .merge(Toml::string(
                r#"
                [telegram]
                bot_token = "123:abc"

                [poll]
                delay_secs = 2
                timeout_secs = 10

                [dispatch]
                queue_capacity = 32
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(config.poll.delay_secs, 2);
        assert_eq!(config.poll.timeout_secs, 10);
        assert_eq!(config.dispatch.queue_capacity, 32);
    }
}
