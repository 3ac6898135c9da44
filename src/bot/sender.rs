//! Message delivery with human-like pacing.
//!
//! The post-send delay is part of the sender's contract: bulk callers
//! rely on it for throttling and must not layer a second delay on top.
//! The delay only applies after a *successful* send. A failed target
//! already cost wall-clock time in bounded waits.

use async_trait::async_trait;
use rand::distr::{Distribution, Uniform};
use std::time::Duration;
use tracing::warn;

use crate::automation::driver::PageDriver;
use crate::automation::error::{BotError, Result};
use crate::automation::selector;
use crate::bot::bulk::TargetSender;
use crate::bot::instance::Bot;
use crate::bot::resolver;

const MESSAGE_INPUT_TIMEOUT: Duration = Duration::from_secs(15);

/// Draw a pacing delay uniformly from `[min_ms, max_ms]`, inclusive on
/// both ends. Swapped bounds are tolerated rather than panicking.
pub fn pick_delay(min_ms: u64, max_ms: u64) -> Duration {
    let (lo, hi) = if min_ms <= max_ms {
        (min_ms, max_ms)
    } else {
        (max_ms, min_ms)
    };
    let ms = {
        let mut rng = rand::rng();
        let dist = Uniform::new_inclusive(lo, hi).unwrap();
        dist.sample(&mut rng)
    };
    Duration::from_millis(ms)
}

async fn deliver(driver: &PageDriver, handle: &str, text: &str, settle: Duration) -> Result<()> {
    resolver::open_conversation(driver, handle, settle).await?;

    let input = driver
        .wait_for(&selector::message_input(), MESSAGE_INPUT_TIMEOUT)
        .await?;
    driver.clear_and_fill(&input, text).await?;
    driver.press_enter(&input).await?;
    Ok(())
}

impl Bot {
    /// Send one message to one target. On any failure a diagnostic
    /// snapshot tagged with the handle is captured and the failure is
    /// returned. Callers in a batch count it and move on.
    pub async fn send_message(&self, handle: &str, text: &str) -> Result<()> {
        if !self.is_logged_in() {
            return Err(BotError::SessionUnavailable);
        }

        let outcome = {
            let guard = self.session_required().await?;
            let session = guard.as_ref().expect("session checked by guard");
            let driver = session.driver();

            let settle = Duration::from_millis(self.config.search_settle_ms);
            match deliver(driver, handle, text, settle).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    warn!("bot '{}': send to '{}' failed: {}", self.id, handle, e);
                    driver.snapshot(&format!("send_fail_{}", handle)).await;
                    Err(e)
                }
            }
            // session guard drops here so the pacing sleep never holds
            // the context hostage
        };

        if outcome.is_ok() {
            tokio::time::sleep(pick_delay(self.config.min_delay_ms, self.config.max_delay_ms)).await;
        }
        outcome
    }
}

#[async_trait]
impl TargetSender for Bot {
    async fn send_to(&self, handle: &str, message: &str) -> Result<()> {
        self.send_message(handle, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_inclusive_bounds() {
        for _ in 0..200 {
            let d = pick_delay(100, 250);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_delay_degenerate_and_swapped_bounds() {
        assert_eq!(pick_delay(300, 300), Duration::from_millis(300));
        let d = pick_delay(500, 100);
        assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(500));
    }
}
