//! Failure taxonomy for the automation engine.
//!
//! Everything the engine reports flows through [`BotError`]; nothing in
//! the core panics or escalates past the operation that failed. Login
//! tri-states (`already_logged_in`, `waiting_for_code`, …) are outcomes,
//! not errors; see `bot::login::LoginOutcome`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// A required UI element never appeared within its bounded wait.
    /// Either the remote page is slow/unavailable or the UI contract
    /// changed underneath us. The snapshot (when capture succeeded)
    /// points at a PNG of the page at failure time.
    #[error("element not found: {what}")]
    ElementNotFound {
        what: String,
        snapshot: Option<PathBuf>,
    },

    /// Conversation search yielded no match for this query. Terminal for
    /// the one operation; retrying with the same query will not change
    /// the result.
    #[error("target not found: {query}")]
    TargetNotFound { query: String },

    /// Operation attempted with no live authenticated session. Always a
    /// caller sequencing error.
    #[error("no active session for this bot instance")]
    SessionUnavailable,

    /// The underlying CDP driver rejected an operation.
    #[error("browser driver error: {0}")]
    Driver(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for BotError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        BotError::Driver(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
