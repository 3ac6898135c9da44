use std::path::PathBuf;

use crate::automation::SessionStore;
use crate::bot::BotRegistry;
use crate::core::config::PeykConfig;
use crate::storage::DataStore;

/// Shared application state: the bot ownership table plus the data
/// stores, rooted at one data directory. Wrapped in `Arc` for axum.
pub struct AppState {
    pub config: PeykConfig,
    pub registry: BotRegistry,
    pub store: DataStore,
    pub sessions: SessionStore,
    pub snapshot_dir: PathBuf,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bots", &self.registry.ids())
            .finish()
    }
}

impl AppState {
    pub fn new(config: PeykConfig) -> Self {
        let data_dir = config.resolve_data_dir();
        let snapshot_dir = data_dir.join("snapshots");
        Self {
            registry: BotRegistry::new(),
            store: DataStore::new(&data_dir),
            sessions: SessionStore::new(data_dir.join("sessions")),
            snapshot_dir,
            config,
        }
    }
}
