//! Long-poll wait loop.
//!
//! Re-checks the viewer's change token on a fast-then-slow schedule until it
//! differs from what the client already holds or the timeout passes. A graph
//! update on the broadcast channel cuts the current pause short. The loop has
//! no cleanup of its own: dropping the future (client gone) stops it and
//! releases the subscription.
use std::{future::Future, time::Duration};

use tokio::{sync::broadcast, time::Instant};

use crate::{api::error, modules::events::GraphUpdate};

#[derive(Debug, Clone, Copy)]
pub struct LongPollConfig {
    pub timeout: Duration,
    pub fast_attempts: u32,
    pub fast_interval: Duration,
    pub slow_interval: Duration,
}

impl LongPollConfig {
    /// Pause before re-check number `attempt` (zero-based).
    pub fn interval(&self, attempt: u32) -> Duration {
        if attempt < self.fast_attempts { self.fast_interval } else { self.slow_interval }
    }
}

impl Default for LongPollConfig {
    fn default() -> Self {
        LongPollConfig {
            timeout: Duration::from_secs(20),
            fast_attempts: 5,
            fast_interval: Duration::from_millis(500),
            slow_interval: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Changed(String),
    TimedOut(String),
}

pub async fn wait_for_change<F, Fut>(
    config: &LongPollConfig,
    mut updates: broadcast::Receiver<GraphUpdate>,
    known_etag: &str,
    mut current_etag: F,
) -> Result<WaitOutcome, error::SystemError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, error::SystemError>>,
{
    let deadline = Instant::now() + config.timeout;
    let mut listening = true;
    let mut attempt = 0;

    loop {
        let etag = current_etag().await?;
        if etag != known_etag {
            tracing::debug!("Long poll saw a change after {} re-check(s)", attempt);
            return Ok(WaitOutcome::Changed(etag));
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!("Long poll timed out after {} re-check(s)", attempt);
            return Ok(WaitOutcome::TimedOut(etag));
        }

        let pause = config.interval(attempt).min(deadline - now);
        attempt += 1;

        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            update = updates.recv(), if listening => {
                // Lagged still means something happened; Closed means we fall back to sleeping.
                if let Err(broadcast::error::RecvError::Closed) = update {
                    listening = false;
                }
            }
        }
    }
}
