//! UI driver adapter over one live CDP page.
//!
//! The remote client is a single-page app whose DOM we do not control,
//! so every locate goes through a [`SelectorStrategy`] and a JS-side
//! visibility check instead of a bare `querySelector`. Matching happens
//! inside the page (CSS cannot express text containment); the winning
//! node is tagged with a nonce attribute so a real [`Element`] handle
//! can be fetched for trusted clicks and key input.
//!
//! The page is not safely reentrant. Callers serialize access through
//! the owning session's lock, and this adapter performs exactly one
//! logical operation per call.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::error::{BotError, Result};
use super::selector::{resolve_first, Candidate, CandidateProbe, SelectorStrategy};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const HIT_ATTR: &str = "data-peyk-hit";

pub struct PageDriver {
    page: Page,
    snapshot_dir: PathBuf,
    hit_seq: AtomicU64,
}

impl PageDriver {
    pub fn new(page: Page, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            page,
            snapshot_dir: snapshot_dir.into(),
            hit_seq: AtomicU64::new(0),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate and wait for the load to commit, bounded by `timeout`.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BotError::Driver(format!("navigation to {} failed: {}", url, e))),
            Err(_) => Err(BotError::Driver(format!(
                "navigation to {} timed out after {:?}",
                url, timeout
            ))),
        }
    }

    /// One non-blocking resolution pass over a strategy's candidates.
    pub async fn try_resolve(&self, strategy: &SelectorStrategy) -> Option<Element> {
        let mut probe = PageProbe { driver: self };
        match resolve_first(strategy, &mut probe).await {
            Some((0, el)) => Some(el),
            Some((idx, el)) => {
                debug!(
                    "{}: primary selector missed, matched via fallback level {}",
                    strategy.name, idx
                );
                Some(el)
            }
            None => None,
        }
    }

    /// Poll for a visible match of `strategy` until `timeout` elapses.
    /// On exhaustion captures a diagnostic snapshot and reports
    /// `ElementNotFound`.
    pub async fn wait_for(&self, strategy: &SelectorStrategy, timeout: Duration) -> Result<Element> {
        let start = Instant::now();
        loop {
            if let Some(el) = self.try_resolve(strategy).await {
                return Ok(el);
            }
            if start.elapsed() >= timeout {
                let snapshot = self.snapshot(strategy.name).await;
                return Err(BotError::ElementNotFound {
                    what: strategy.name.to_string(),
                    snapshot,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Focus the element, clear whatever it holds (works for inputs and
    /// contenteditables alike), and type `text` as trusted key events.
    pub async fn clear_and_fill(&self, el: &Element, text: &str) -> Result<()> {
        el.scroll_into_view().await?;
        el.click().await?;
        el.call_js_fn(
            r#"function() {
                if ('value' in this) { this.value = ''; }
                this.textContent = '';
            }"#,
            false,
        )
        .await?;
        el.type_str(text).await?;
        Ok(())
    }

    /// Click a resolved entry, scrolling it into view first.
    pub async fn click(&self, el: &Element) -> Result<()> {
        el.scroll_into_view().await?;
        el.click().await?;
        Ok(())
    }

    /// Commit the focused input the way a user would.
    pub async fn press_enter(&self, el: &Element) -> Result<()> {
        el.press_key("Enter").await?;
        Ok(())
    }

    /// Scroll the first matching history container to its very top.
    /// Returns false when no container matched (conversation not open).
    pub async fn scroll_container_to_top(&self, css: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({css});
                if (!el) return false;
                el.scrollTop = 0;
                return true;
            }})()"#,
            css = js_str(css)
        );
        self.eval_json::<bool>(&script).await
    }

    /// Inner text of every element matching `css`, in document order.
    pub async fn collect_texts(&self, css: &str) -> Result<Vec<String>> {
        let script = format!(
            r#"(() => {{
                const out = [];
                document.querySelectorAll({css}).forEach(el => {{
                    out.push(el.innerText || el.textContent || '');
                }});
                return JSON.stringify(out);
            }})()"#,
            css = js_str(css)
        );
        let raw: String = self.eval_json(&script).await?;
        serde_json::from_str(&raw)
            .map_err(|e| BotError::Driver(format!("malformed text collection: {}", e)))
    }

    /// Capture a PNG of the page for post-mortem debugging. Best-effort:
    /// a failed capture is logged, never escalated.
    pub async fn snapshot(&self, tag: &str) -> Option<PathBuf> {
        if let Err(e) = std::fs::create_dir_all(&self.snapshot_dir) {
            warn!("snapshot dir {} unavailable: {}", self.snapshot_dir.display(), e);
            return None;
        }
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let safe_tag: String = tag
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        let path = self.snapshot_dir.join(format!("{}_{}.png", safe_tag, stamp));
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        match self.page.save_screenshot(params, &path).await {
            Ok(_) => {
                info!("diagnostic snapshot captured: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("snapshot capture failed for '{}': {}", tag, e);
                None
            }
        }
    }

    async fn eval_json<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self
            .page
            .evaluate(script)
            .await?
            .into_value::<T>()
            .map_err(|e| BotError::Driver(format!("evaluation result mismatch: {}", e)))?;
        Ok(value)
    }

    /// Tag the first visible match of `candidate` with a fresh nonce and
    /// return an element handle to it.
    async fn probe_candidate(&self, candidate: &Candidate) -> Option<Element> {
        let nonce = self.hit_seq.fetch_add(1, Ordering::Relaxed).to_string();
        let needle = match &candidate.contains_text {
            Some(t) => js_str(t),
            None => "null".to_string(),
        };
        let script = format!(
            r#"(() => {{
                document.querySelectorAll('[{attr}]').forEach(el => el.removeAttribute('{attr}'));
                const needle = {needle};
                for (const el of document.querySelectorAll({css})) {{
                    const rect = el.getBoundingClientRect();
                    if (rect.width <= 0 || rect.height <= 0) continue;
                    if (needle !== null && !(el.textContent || '').includes(needle)) continue;
                    el.setAttribute('{attr}', {nonce});
                    return true;
                }}
                return false;
            }})()"#,
            attr = HIT_ATTR,
            needle = needle,
            css = js_str(&candidate.css),
            nonce = js_str(&nonce),
        );
        let hit: bool = self.eval_json(&script).await.ok()?;
        if !hit {
            return None;
        }
        self.page
            .find_element(format!(r#"[{}="{}"]"#, HIT_ATTR, nonce))
            .await
            .ok()
    }
}

struct PageProbe<'a> {
    driver: &'a PageDriver,
}

#[async_trait]
impl CandidateProbe for PageProbe<'_> {
    type Hit = Element;

    async fn probe(&mut self, candidate: &Candidate) -> Option<Element> {
        self.driver.probe_candidate(candidate).await
    }
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str(r#"a"b"#), r#""a\"b""#);
        assert_eq!(js_str("plain"), "\"plain\"");
    }
}
