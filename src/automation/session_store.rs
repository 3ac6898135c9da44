//! Persisted credential blobs — one JSON file per bot instance.
//!
//! The web client keeps its authentication in a mix of cookies and
//! `localStorage`, so both are exported after a successful login and
//! replayed at session start. Cookies are stored as raw JSON values and
//! deserialized into [`CookieParam`]s on injection; any individual entry
//! that fails to deserialize is silently skipped so a partially-stale
//! file never blocks a login attempt.

use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::{BotError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoredSession {
    pub cookies: Vec<serde_json::Value>,
    #[serde(default)]
    pub local_storage: BTreeMap<String, String>,
    pub saved_at: String,
}

/// Filesystem home of the credential blobs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, bot_id: &str) -> PathBuf {
        let safe: String = bot_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("session_{}.json", safe))
    }

    /// Load the stored blob for a bot, if one exists and parses.
    pub fn load(&self, bot_id: &str) -> Option<StoredSession> {
        let path = self.path_for(bot_id);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(blob) => {
                info!(
                    "loaded persisted session for bot '{}' ({} cookies, {} storage keys)",
                    bot_id,
                    blob.cookies.len(),
                    blob.local_storage.len()
                );
                Some(blob)
            }
            Err(e) => {
                warn!("persisted session for bot '{}' unreadable: {}", bot_id, e);
                None
            }
        }
    }

    /// Write the blob atomically (temp file + rename).
    pub fn save(&self, bot_id: &str, blob: &StoredSession) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(bot_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(blob)
            .map_err(|e| BotError::Driver(format!("session serialize failed: {}", e)))?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        info!(
            "persisted session for bot '{}' ({} cookies) at {}",
            bot_id,
            blob.cookies.len(),
            path.display()
        );
        Ok(())
    }

    /// Remove the stored blob so the next login starts fresh.
    pub fn clear(&self, bot_id: &str) {
        let path = self.path_for(bot_id);
        if path.exists() {
            match std::fs::remove_file(&path) {
                Ok(()) => info!("removed persisted session for bot '{}'", bot_id),
                Err(e) => warn!(
                    "failed to remove session file {}: {}",
                    path.display(),
                    e
                ),
            }
        }
    }

    pub fn exists(&self, bot_id: &str) -> bool {
        self.path_for(bot_id).exists()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

// ── Page-level export / restore ──────────────────────────────────────────────

/// Export the live page's cookies and origin localStorage into a blob.
pub async fn export_from_page(page: &Page) -> Result<StoredSession> {
    let cookies = page.get_cookies().await?;
    let raw_cookies: Vec<serde_json::Value> = cookies
        .iter()
        .filter_map(|c| serde_json::to_value(c).ok())
        .collect();

    let raw_storage: String = page
        .evaluate("JSON.stringify(Object.assign({}, window.localStorage))")
        .await?
        .into_value()
        .map_err(|e| BotError::Driver(format!("localStorage export failed: {}", e)))?;
    let local_storage: BTreeMap<String, String> =
        serde_json::from_str(&raw_storage).unwrap_or_default();

    Ok(StoredSession {
        cookies: raw_cookies,
        local_storage,
        saved_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Replay a stored blob into a live page. Call while already on the
/// client's origin (localStorage is origin-scoped), then reload so the
/// app boots with the restored state.
pub async fn restore_into_page(page: &Page, blob: &StoredSession) -> Result<()> {
    let cookie_params: Vec<CookieParam> = blob
        .cookies
        .iter()
        .filter_map(|v| serde_json::from_value::<CookieParam>(v.clone()).ok())
        .collect();

    if !cookie_params.is_empty() {
        let count = cookie_params.len();
        page.set_cookies(cookie_params).await?;
        info!("injected {} persisted cookies", count);
    }

    if !blob.local_storage.is_empty() {
        let payload = serde_json::to_string(&blob.local_storage)
            .map_err(|e| BotError::Driver(format!("localStorage payload: {}", e)))?;
        let script = format!(
            r#"(() => {{
                const entries = {payload};
                for (const [k, v] of Object.entries(entries)) {{
                    window.localStorage.setItem(k, v);
                }}
                return Object.keys(entries).length;
            }})()"#,
        );
        let restored: i64 = page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| BotError::Driver(format!("localStorage restore failed: {}", e)))?;
        info!("restored {} localStorage keys", restored);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> SessionStore {
        SessionStore::new(dir)
    }

    #[test]
    fn test_round_trip_and_clear() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        assert!(store.load("b1").is_none());
        assert!(!store.exists("b1"));

        let blob = StoredSession {
            cookies: vec![serde_json::json!({"name": "sid", "value": "x", "domain": ".eitaa.com"})],
            local_storage: [("auth_key".to_string(), "abc".to_string())].into(),
            saved_at: "2026-01-01T00:00:00Z".to_string(),
        };
        store.save("b1", &blob).unwrap();
        assert!(store.exists("b1"));

        let loaded = store.load("b1").unwrap();
        assert_eq!(loaded.cookies.len(), 1);
        assert_eq!(loaded.local_storage.get("auth_key").map(String::as_str), Some("abc"));

        store.clear("b1");
        assert!(!store.exists("b1"));
    }

    #[test]
    fn test_bot_id_is_sanitized_for_filenames() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        store.save("../evil/../id", &StoredSession::default()).unwrap();
        // the file lands inside the store dir, not wherever the id points
        let entries: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
