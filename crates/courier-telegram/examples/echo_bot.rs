//! Minimal bot: `/echo` replies with its arguments, `/survey` shows a
//! multi-step conversation built on `wait_next`.
//!
//! Run with a `courier.toml` next to the binary:
//!
//! ```toml
//! [telegram]
//! bot_token = "123456:ABC-DEF..."
//! ```

use std::time::Duration;

use courier_core::config::CourierConfig;
use courier_telegram::{BotFramework, BotRequest};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = CourierConfig::load(None)?;
    let mut bot = BotFramework::connect(&config).await?;

    bot.add_route("echo", |req: BotRequest| async move {
        let _ = req.quick_reply(&req.args).await;
    });

    bot.add_route("survey", |req: BotRequest| async move {
        let _ = req.quick_reply("What's your name?").await;
        match req.wait_next_timeout(Duration::from_secs(60)).await {
            Ok(answer) => {
                let text = format!("Nice to meet you, *{}*!", answer.text());
                let _ = answer.quick_reply_md(&text).await;
            }
            Err(_) => {
                let _ = req.quick_reply("Timed out waiting for your answer.").await;
            }
        }
    });

    bot.poll(&config.poll).await?;
    Ok(())
}
