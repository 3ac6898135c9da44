//! Ordered-fallback selector strategies.
//!
//! The Eitaa web client's DOM is an external, versioned interface we do
//! not control: a single brittle selector makes every operation fail
//! outright on minor UI revisions. Each logical element is therefore
//! described by a [`SelectorStrategy`] — an ordered list of candidate
//! locators tried strictly in priority order until one yields a visible
//! match. The resolution policy itself is first-class and testable,
//! independent of any live page (see [`resolve_first`]).

use async_trait::async_trait;

/// One way of locating a logical element: a CSS selector plus an
/// optional text-containment filter (CSS alone cannot match on text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub css: String,
    pub contains_text: Option<String>,
}

impl Candidate {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            contains_text: None,
        }
    }

    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            contains_text: Some(text.into()),
        }
    }
}

/// An ordered list of candidate locators for one logical UI element.
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    pub name: &'static str,
    pub candidates: Vec<Candidate>,
}

impl SelectorStrategy {
    pub fn new(name: &'static str, candidates: Vec<Candidate>) -> Self {
        Self { name, candidates }
    }
}

/// A probe that can test one candidate for a visible match. The page
/// driver implements this against the live DOM; tests implement it with
/// scripted answers.
#[async_trait]
pub trait CandidateProbe {
    type Hit: Send;

    async fn probe(&mut self, candidate: &Candidate) -> Option<Self::Hit>;
}

/// Try each candidate in priority order; the first probe hit wins.
/// Returns the winning candidate index alongside the hit so callers can
/// log which fallback level fired.
pub async fn resolve_first<P>(strategy: &SelectorStrategy, probe: &mut P) -> Option<(usize, P::Hit)>
where
    P: CandidateProbe + Send,
{
    for (idx, candidate) in strategy.candidates.iter().enumerate() {
        if let Some(hit) = probe.probe(candidate).await {
            return Some((idx, hit));
        }
    }
    None
}

// ── Eitaa web client selector catalog ────────────────────────────────────────

pub const LOGIN_URL: &str = "https://web.eitaa.com/";

/// The phone-number field on the login page (a contenteditable div, not
/// an input).
pub fn phone_input() -> SelectorStrategy {
    SelectorStrategy::new(
        "phone_input",
        vec![
            Candidate::css(r#"div.input-field-phone div.input-field-input[contenteditable="true"]"#),
            Candidate::css(r#"div.input-field-input[contenteditable="true"]"#),
        ],
    )
}

/// The verification-code field shown after phone submission.
pub fn code_input() -> SelectorStrategy {
    SelectorStrategy::new(
        "code_input",
        vec![
            Candidate::css(r#"input[type="tel"]"#),
            Candidate::css(r#"input.input-field-input[type="tel"]"#),
        ],
    )
}

/// The chat-search input — only rendered once authenticated, so it
/// doubles as the logged-in marker.
pub fn search_input() -> SelectorStrategy {
    SelectorStrategy::new(
        "search_input",
        vec![
            Candidate::css("input.input-search-input"),
            Candidate::css(r#".sidebar-header input[type="text"]"#),
        ],
    )
}

/// A conversation entry in the search result list matching `query`.
/// Layered: exact structural title match, then any list item containing
/// the text, then the broadest text-containing element.
pub fn chat_entry(query: &str) -> SelectorStrategy {
    let needle = query.trim_start_matches('@').to_string();
    SelectorStrategy::new(
        "chat_entry",
        vec![
            Candidate::css_with_text("li.chatlist-chat .user-title", needle.clone()),
            Candidate::css_with_text("li.chatlist-chat", needle.clone()),
            Candidate::css_with_text(".chatlist li, ul.chatlist-new li, .search-group li", needle),
        ],
    )
}

/// The message composer of an open conversation. The client renders a
/// decorative placeholder div with the same class; the driver's
/// visibility check plus the contenteditable filter keeps us off it.
pub fn message_input() -> SelectorStrategy {
    SelectorStrategy::new(
        "message_input",
        vec![
            Candidate::css(r#"div.input-message-input[contenteditable="true"]"#),
            Candidate::css(r#".chat-input div[contenteditable="true"]"#),
        ],
    )
}

/// Rendered message bubbles of the open conversation, oldest first.
pub const MESSAGE_TEXTS: &str = "div.bubble div.message";

/// The scrollable history container of the open conversation.
pub const HISTORY_CONTAINER: &str = ".bubbles-inner, .scrollable-y";
