//! Conversation target resolution.
//!
//! Fill the search field, give the client's incremental search a settle
//! interval to render, then try the layered `chat_entry` strategies
//! until one yields a visible, clickable entry. Exhaustion is
//! `TargetNotFound`: reported, never retried internally, because
//! re-running an unchanged query will not change the result.

use chromiumoxide::element::Element;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::automation::driver::PageDriver;
use crate::automation::error::{BotError, Result};
use crate::automation::selector;

const SEARCH_FIELD_TIMEOUT: Duration = Duration::from_secs(10);
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(15);
const RESOLVE_POLL: Duration = Duration::from_millis(500);

/// Resolve `query` (an `@handle` or display name) to a clickable
/// conversation entry.
pub(crate) async fn resolve_target(
    driver: &PageDriver,
    query: &str,
    settle: Duration,
) -> Result<Element> {
    let search = driver
        .wait_for(&selector::search_input(), SEARCH_FIELD_TIMEOUT)
        .await?;
    driver.clear_and_fill(&search, query).await?;

    // Let the incremental search results render before matching.
    tokio::time::sleep(settle).await;

    let strategy = selector::chat_entry(query);
    let start = Instant::now();
    loop {
        if let Some(entry) = driver.try_resolve(&strategy).await {
            debug!("resolved target '{}'", query);
            return Ok(entry);
        }
        if start.elapsed() >= RESOLVE_TIMEOUT {
            return Err(BotError::TargetNotFound {
                query: query.to_string(),
            });
        }
        tokio::time::sleep(RESOLVE_POLL).await;
    }
}

/// Resolve and click a conversation entry, leaving the conversation
/// open in the page.
pub(crate) async fn open_conversation(
    driver: &PageDriver,
    query: &str,
    settle: Duration,
) -> Result<()> {
    let entry = resolve_target(driver, query, settle).await?;
    driver.click(&entry).await?;
    Ok(())
}
