//! Mention harvesting from group history.
//!
//! Campaigns reuse a group to repost a fresh mention list under a
//! recognizable prefix; the most recent prefixed message supersedes
//! older ones. The scan therefore walks the rendered history from the
//! newest message backward and stops at the first prefix match: the
//! canonical answer, found with the least work in the common case.

use std::time::Duration;
use tracing::{debug, info};

use crate::automation::error::{BotError, Result};
use crate::automation::selector;
use crate::bot::instance::Bot;
use crate::bot::resolver;
use crate::text::{extract_mentions, normalize_persian};

/// History loads incrementally; one scroll rarely reaches older
/// messages, so the container is driven to its top a few times with
/// settle waits in between.
const SCROLL_ATTEMPTS: usize = 4;
const SCROLL_SETTLE: Duration = Duration::from_millis(1_500);

/// Newest-first scan: the raw text of the most recent message whose
/// normalized text starts with the normalized prefix. `texts` is in
/// display order, oldest first.
pub fn latest_with_prefix(texts: &[String], prefix: &str) -> Option<String> {
    let wanted = normalize_persian(prefix);
    texts
        .iter()
        .rev()
        .find(|t| normalize_persian(t).starts_with(&wanted))
        .cloned()
}

impl Bot {
    /// Open `group_name` and harvest the distinct `@handle` tokens of
    /// its most recent message starting with `message_prefix`.
    ///
    /// No matching message is a normal outcome and yields an empty list.
    pub async fn extract_group_mentions(
        &self,
        group_name: &str,
        message_prefix: &str,
    ) -> Result<Vec<String>> {
        if !self.is_logged_in() {
            return Err(BotError::SessionUnavailable);
        }

        let guard = self.session_required().await?;
        let session = guard.as_ref().expect("session checked by guard");
        let driver = session.driver();

        let settle = Duration::from_millis(self.config.search_settle_ms);
        resolver::open_conversation(driver, group_name, settle).await?;

        // Give the conversation pane its first paint before scrolling.
        tokio::time::sleep(SCROLL_SETTLE).await;

        for attempt in 0..SCROLL_ATTEMPTS {
            let scrolled = driver
                .scroll_container_to_top(selector::HISTORY_CONTAINER)
                .await?;
            if !scrolled {
                debug!(
                    "bot '{}': history container not present on attempt {}",
                    self.id,
                    attempt + 1
                );
            }
            tokio::time::sleep(SCROLL_SETTLE).await;
        }

        let texts = driver.collect_texts(selector::MESSAGE_TEXTS).await?;
        debug!(
            "bot '{}': scanned {} rendered messages in '{}'",
            self.id,
            texts.len(),
            group_name
        );

        match latest_with_prefix(&texts, message_prefix) {
            Some(raw) => {
                let handles = extract_mentions(&raw);
                info!(
                    "bot '{}': harvested {} handles from '{}'",
                    self.id,
                    handles.len(),
                    group_name
                );
                Ok(handles)
            }
            None => {
                debug!(
                    "bot '{}': no message in '{}' starts with the given prefix",
                    self.id, group_name
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msgs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_newest_matching_message_wins() {
        let texts = msgs(&["hi", "PROMO: @a @b", "unrelated", "PROMO: @c @d"]);
        let hit = latest_with_prefix(&texts, "PROMO").unwrap();
        assert_eq!(hit, "PROMO: @c @d");
        assert_eq!(extract_mentions(&hit), vec!["@c", "@d"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let texts = msgs(&["hello", "world"]);
        assert!(latest_with_prefix(&texts, "PROMO").is_none());
    }

    #[test]
    fn test_prefix_matching_folds_glyph_variants() {
        // stored message written with Arabic yeh/kaf, prefix typed in Persian
        let arabic = "\u{0643}\u{064A} @user1";
        let texts = msgs(&["noise", arabic]);
        let hit = latest_with_prefix(&texts, "\u{06A9}\u{06CC}").unwrap();
        assert_eq!(hit, arabic);
    }

    #[test]
    fn test_empty_history() {
        assert!(latest_with_prefix(&[], "PROMO").is_none());
    }
}
