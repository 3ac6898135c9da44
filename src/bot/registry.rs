//! Keyed ownership table of live bot instances.
//!
//! A single coarse lock guards create/lookup/remove; each entry
//! exclusively owns its `AutomationSession` through the `Bot` itself.
//! Teardown of the browsing context happens outside the lock; the
//! registry only hands ownership around.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::bot::instance::Bot;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("bot id '{0}' already exists")]
    Occupied(String),
}

#[derive(Default)]
pub struct BotRegistry {
    inner: Mutex<HashMap<String, Arc<Bot>>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bot: Arc<Bot>) -> Result<Arc<Bot>, RegistryError> {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(&bot.id) {
            return Err(RegistryError::Occupied(bot.id.clone()));
        }
        map.insert(bot.id.clone(), bot.clone());
        Ok(bot)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Bot>> {
        self.inner.lock().unwrap().get(id).cloned()
    }

    /// Detach the instance from the table. The caller owns the returned
    /// `Arc` and is responsible for `shutdown()`.
    pub fn remove(&self, id: &str) -> Option<Arc<Bot>> {
        self.inner.lock().unwrap().remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Every live instance, for shutdown sweeps.
    pub fn drain_all(&self) -> Vec<Arc<Bot>> {
        self.inner.lock().unwrap().drain().map(|(_, b)| b).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::SessionStore;
    use crate::bot::instance::BotConfig;

    fn make_bot(id: &str) -> Arc<Bot> {
        let tmp = std::env::temp_dir().join("peyk-registry-test");
        Bot::new(
            id,
            BotConfig::default(),
            SessionStore::new(tmp.join("sessions")),
            tmp.join("snapshots"),
        )
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let registry = BotRegistry::new();
        registry.insert(make_bot("a")).unwrap();
        assert!(matches!(
            registry.insert(make_bot("a")),
            Err(RegistryError::Occupied(_))
        ));
    }

    #[test]
    fn test_remove_detaches_instance() {
        let registry = BotRegistry::new();
        registry.insert(make_bot("a")).unwrap();
        assert!(registry.get("a").is_some());
        let detached = registry.remove("a").unwrap();
        assert_eq!(detached.id, "a");
        assert!(registry.get("a").is_none());
    }
}
