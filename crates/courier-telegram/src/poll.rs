//! Long-poll update driver with exponential backoff on transport failures.

use std::sync::Arc;

use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use courier_core::config::PollConfig;

use crate::api::TelegramApi;
use crate::error::Result;
use crate::framework::UpdatePipeline;

/// Minimum delay between reconnect attempts (seconds).
const BACKOFF_BASE_SECS: u64 = 5;
/// Maximum delay between reconnect attempts (seconds).
const BACKOFF_MAX_SECS: u64 = 300; // 5 minutes
/// Consecutive failures tolerated before the loop gives up.
const MAX_ATTEMPTS: u32 = 10;
/// Jitter fraction applied to each delay (±10 %).
const JITTER_FRACTION: f64 = 0.10;

/// Fetch and process updates until the Bot API stays down through the whole
/// backoff schedule. A single successful batch resets the failure counter.
pub(crate) async fn run(
    pipeline: Arc<UpdatePipeline>,
    api: Arc<TelegramApi>,
    config: PollConfig,
) -> Result<()> {
    info!(timeout_secs = config.timeout_secs, "starting long-poll update loop");

    let mut offset: i64 = 0;
    let mut failures: u32 = 0;
    let mut delay_secs = BACKOFF_BASE_SECS;

    loop {
        match api
            .get_updates(offset, config.timeout_secs, &config.allowed_updates)
            .await
        {
            Ok(updates) => {
                failures = 0;
                delay_secs = BACKOFF_BASE_SECS;

                let batch_empty = updates.is_empty();
                for update in updates {
                    // Confirm the update on the next getUpdates call.
                    offset = offset.max(update.update_id + 1);
                    pipeline.process(update).await;
                }

                if batch_empty && config.delay_secs > 0 {
                    sleep(Duration::from_secs(config.delay_secs)).await;
                }
            }
            Err(e) => {
                failures += 1;
                if failures >= MAX_ATTEMPTS {
                    error!(error = %e, attempts = failures, "giving up on getUpdates");
                    return Err(e);
                }

                let total = delay_secs + jitter_secs(delay_secs);
                warn!(
                    error = %e,
                    attempt = failures,
                    max = MAX_ATTEMPTS,
                    retry_after_secs = total,
                    "getUpdates failed, backing off"
                );
                sleep(Duration::from_secs(total)).await;
                delay_secs = (delay_secs * 2).min(BACKOFF_MAX_SECS);
            }
        }
    }
}

/// Return a jitter offset (0 … `JITTER_FRACTION * base_secs`) as integer seconds.
///
/// Uses a simple deterministic pseudo-random value derived from the current
/// monotonic timestamp, avoiding a rand dependency.
fn jitter_secs(base_secs: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let max_jitter = ((base_secs as f64) * JITTER_FRACTION) as u64;
    if max_jitter == 0 {
        return 0;
    }
    (nanos as u64) % max_jitter
}
