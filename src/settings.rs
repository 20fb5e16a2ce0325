use crate::donation::Charity;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Persistent user settings.
pub trait SettingsStore: Send + Sync {
    fn selected_charity(&self) -> Charity;
    fn set_selected_charity(&self, charity: Charity) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StoredSettings {
    selected_charity: String,
}

/// Settings kept in a small JSON file next to the config.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub const DEFAULT_PATH: &'static str = "settings.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoredSettings {
        if !self.path.exists() {
            return StoredSettings::default();
        }
        match fs::read_to_string(&self.path).map(|s| serde_json::from_str::<StoredSettings>(&s)) {
            Ok(Ok(settings)) => settings,
            Ok(Err(e)) => {
                warn!("Ignoring unreadable settings {}: {}", self.path.display(), e);
                StoredSettings::default()
            }
            Err(e) => {
                warn!("Failed to read settings {}: {}", self.path.display(), e);
                StoredSettings::default()
            }
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn selected_charity(&self) -> Charity {
        Charity::from_id(&self.read().selected_charity)
    }

    fn set_selected_charity(&self, charity: Charity) -> Result<()> {
        let mut settings = self.read();
        settings.selected_charity = charity.id().to_string();
        let content = serde_json::to_string_pretty(&settings)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings {}", self.path.display()))?;
        info!("Selected charity saved: {}", charity);
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
pub struct MemorySettingsStore {
    charity: ArcSwap<Charity>,
}

impl MemorySettingsStore {
    pub fn new(charity: Charity) -> Self {
        Self {
            charity: ArcSwap::from_pointee(charity),
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(Charity::default())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn selected_charity(&self) -> Charity {
        **self.charity.load()
    }

    fn set_selected_charity(&self, charity: Charity) -> Result<()> {
        self.charity.store(Arc::new(charity));
        Ok(())
    }
}

/// Live configuration read by the frame loop and written by the UI.
/// Reads always see the latest selection; the loop is never rebuilt.
#[derive(Clone)]
pub struct LiveSettings {
    charity: Arc<ArcSwap<Charity>>,
    store: Arc<dyn SettingsStore>,
}

impl LiveSettings {
    /// Seeds the live cell from the store.
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        let charity = store.selected_charity();
        Self {
            charity: Arc::new(ArcSwap::from_pointee(charity)),
            store,
        }
    }

    pub fn in_memory(charity: Charity) -> Self {
        Self::new(Arc::new(MemorySettingsStore::new(charity)))
    }

    pub fn charity(&self) -> Charity {
        **self.charity.load()
    }

    /// Switch charity for the running session and persist it. The live value
    /// changes even if persisting fails.
    pub fn select(&self, charity: Charity) -> Result<()> {
        self.charity.store(Arc::new(charity));
        self.store.set_selected_charity(charity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_store_round_trips_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.selected_charity(), Charity::Rc);

        store.set_selected_charity(Charity::Unicef).unwrap();
        let reopened = JsonSettingsStore::new(store.path().to_path_buf());
        assert_eq!(reopened.selected_charity(), Charity::Unicef);
    }

    #[test]
    fn unknown_stored_id_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "selected_charity": "spca" }"#).unwrap();
        assert_eq!(JsonSettingsStore::new(&path).selected_charity(), Charity::Rc);

        fs::write(&path, "{{{").unwrap();
        assert_eq!(JsonSettingsStore::new(&path).selected_charity(), Charity::Rc);
    }

    #[test]
    fn live_settings_see_latest_selection() {
        let store = Arc::new(MemorySettingsStore::new(Charity::Wwf));
        let live = LiveSettings::new(store.clone());
        let reader = live.clone();
        assert_eq!(reader.charity(), Charity::Wwf);

        live.select(Charity::Gd).unwrap();
        assert_eq!(reader.charity(), Charity::Gd);
        assert_eq!(store.selected_charity(), Charity::Gd);
    }
}
