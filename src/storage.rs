//! JSON-file persistence for operator data: settings, the saved contact
//! book, and per-run send reports.
//!
//! Writes go through a temp-file + rename so a crash mid-write never
//! corrupts the previous state. All access flows through the single
//! `AppState`-owned [`DataStore`], so no cross-process locking is
//! needed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ── Data shapes ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub message_template: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_delay_ms: 2_000,
            max_delay_ms: 5_000,
            message_template: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactEntry {
    pub handle: String,
    pub source: String,
    pub added_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReport {
    pub bot_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub stopped: bool,
}

// ── Store ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    fn contacts_path(&self) -> PathBuf {
        self.root.join("contacts.json")
    }

    fn reports_path(&self) -> PathBuf {
        self.root.join("reports.json")
    }

    pub fn settings(&self) -> Settings {
        read_json(&self.settings_path()).unwrap_or_default()
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        atomic_write_json(&self.settings_path(), settings)
    }

    pub fn contacts(&self) -> Vec<ContactEntry> {
        read_json(&self.contacts_path()).unwrap_or_default()
    }

    /// Merge handles into the contact book, skipping ones already saved.
    /// Returns how many were actually added.
    pub fn add_contacts(&self, handles: &[String], source: &str) -> Result<usize> {
        let mut contacts = self.contacts();
        let known: std::collections::HashSet<String> =
            contacts.iter().map(|c| c.handle.clone()).collect();
        let now = chrono::Utc::now().to_rfc3339();
        let mut added = 0;
        for handle in handles {
            if known.contains(handle) {
                continue;
            }
            contacts.push(ContactEntry {
                handle: handle.clone(),
                source: source.to_string(),
                added_at: now.clone(),
            });
            added += 1;
        }
        if added > 0 {
            atomic_write_json(&self.contacts_path(), &contacts)?;
        }
        Ok(added)
    }

    pub fn remove_contact(&self, handle: &str) -> Result<bool> {
        let mut contacts = self.contacts();
        let before = contacts.len();
        contacts.retain(|c| c.handle != handle);
        let removed = contacts.len() != before;
        if removed {
            atomic_write_json(&self.contacts_path(), &contacts)?;
        }
        Ok(removed)
    }

    pub fn reports(&self) -> Vec<SendReport> {
        read_json(&self.reports_path()).unwrap_or_default()
    }

    pub fn append_report(&self, report: SendReport) {
        let mut reports = self.reports();
        reports.push(report);
        if let Err(e) = atomic_write_json(&self.reports_path(), &reports) {
            warn!("failed to persist send report: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_when_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DataStore::new(tmp.path());
        let s = store.settings();
        assert_eq!(s.min_delay_ms, 2_000);
        assert_eq!(s.max_delay_ms, 5_000);
    }

    #[test]
    fn test_settings_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DataStore::new(tmp.path());
        let s = Settings {
            min_delay_ms: 111,
            max_delay_ms: 222,
            message_template: "سلام".to_string(),
        };
        store.save_settings(&s).unwrap();
        let loaded = store.settings();
        assert_eq!(loaded.min_delay_ms, 111);
        assert_eq!(loaded.message_template, "سلام");
    }

    #[test]
    fn test_contacts_merge_dedupes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DataStore::new(tmp.path());
        let added = store
            .add_contacts(&["@a".into(), "@b".into()], "import")
            .unwrap();
        assert_eq!(added, 2);
        let added = store
            .add_contacts(&["@b".into(), "@c".into()], "group")
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(store.contacts().len(), 3);

        assert!(store.remove_contact("@b").unwrap());
        assert!(!store.remove_contact("@b").unwrap());
        assert_eq!(store.contacts().len(), 2);
    }

    #[test]
    fn test_reports_append() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DataStore::new(tmp.path());
        store.append_report(SendReport {
            bot_id: "b".into(),
            started_at: "t0".into(),
            finished_at: "t1".into(),
            total: 3,
            succeeded: 2,
            failed: 1,
            stopped: false,
        });
        let reports = store.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].succeeded, 2);
    }
}
