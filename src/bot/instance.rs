//! One bot instance: identity, pacing configuration, and exclusive
//! ownership of at most one live [`AutomationSession`].

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::automation::error::{BotError, Result};
use crate::automation::{AutomationSession, SessionStore};
use crate::bot::bulk::SendStats;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub headless: bool,
    /// How long to let the client's incremental search render before
    /// matching results (≥1500 ms per the UI's observed behavior).
    pub search_settle_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 2_000,
            max_delay_ms: 5_000,
            headless: true,
            search_settle_ms: 2_000,
        }
    }
}

/// Login progression. Failures do not get a state of their own: a failed
/// attempt leaves the machine where it was, and the instance stays
/// usable for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    AwaitingCode,
    Authenticated,
}

impl LoginState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginState::Unauthenticated => "unauthenticated",
            LoginState::AwaitingCode => "awaiting_code",
            LoginState::Authenticated => "authenticated",
        }
    }
}

pub struct Bot {
    pub id: String,
    pub config: BotConfig,
    pub stats: Arc<SendStats>,
    pub(crate) session: Mutex<Option<AutomationSession>>,
    pub(crate) store: SessionStore,
    pub(crate) snapshot_dir: PathBuf,
    login: std::sync::Mutex<LoginState>,
}

impl Bot {
    pub fn new(
        id: impl Into<String>,
        config: BotConfig,
        store: SessionStore,
        snapshot_dir: impl Into<PathBuf>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            config,
            stats: Arc::new(SendStats::new()),
            session: Mutex::new(None),
            store,
            snapshot_dir: snapshot_dir.into(),
            login: std::sync::Mutex::new(LoginState::Unauthenticated),
        })
    }

    pub fn login_state(&self) -> LoginState {
        *self.login.lock().unwrap()
    }

    pub(crate) fn set_login_state(&self, state: LoginState) {
        *self.login.lock().unwrap() = state;
    }

    pub fn is_logged_in(&self) -> bool {
        self.login_state() == LoginState::Authenticated
    }

    /// Lock the session slot, launching a browser if none is live yet.
    pub(crate) async fn session_or_launch(
        &self,
    ) -> Result<MutexGuard<'_, Option<AutomationSession>>> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let session = AutomationSession::launch(self.config.headless, &self.snapshot_dir).await?;
            *guard = Some(session);
            info!("bot '{}': session launched", self.id);
        }
        Ok(guard)
    }

    /// Lock the session slot, requiring a live session.
    pub(crate) async fn session_required(
        &self,
    ) -> Result<MutexGuard<'_, Option<AutomationSession>>> {
        let guard = self.session.lock().await;
        if guard.is_none() {
            return Err(BotError::SessionUnavailable);
        }
        Ok(guard)
    }

    /// Tear down the live session, if any. Replacing a session always
    /// goes through here first so the old Chromium process is released
    /// before a new one starts.
    pub async fn close_session(&self) {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            session.close().await;
            info!("bot '{}': session closed", self.id);
        }
    }

    /// Full teardown: stop any running batch, close the session.
    pub async fn shutdown(&self) {
        self.stats.request_stop();
        self.close_session().await;
        self.set_login_state(LoginState::Unauthenticated);
    }

    /// Drop persisted credentials so the next login starts fresh.
    pub fn forget_credentials(&self) {
        self.store.clear(&self.id);
    }
}
