use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::Settings;

/// Unified config manager.
pub struct ConfigManager {
    path: PathBuf,
    settings: Arc<RwLock<Settings>>,
}

impl ConfigManager {
    /// Create a config manager backed by the default settings file.
    pub fn new() -> Self {
        Self::with_path(Settings::settings_path())
    }

    /// Create a config manager backed by `path` (loads once and caches).
    pub fn with_path(path: PathBuf) -> Self {
        let settings = Settings::load_from(&path);
        Self {
            path,
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Get a snapshot copy of current settings.
    pub fn get(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Get the shared settings reference.
    pub fn get_shared(&self) -> Arc<RwLock<Settings>> {
        Arc::clone(&self.settings)
    }

    /// Reload settings from disk.
    pub fn reload(&self) {
        let new_settings = Settings::load_from(&self.path);
        *self.settings.write() = new_settings;
    }

    /// Modify settings and persist them.
    pub fn update<F>(&self, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.settings.write();
        let mut next = guard.clone();
        f(&mut next);
        let next = next.normalized();
        next.save_to(&self.path)?;
        *guard = next;
        Ok(())
    }

    // Convenience accessors.

    #[inline]
    pub fn api_base_url(&self) -> String {
        self.settings.read().api_base_url.clone()
    }

    #[inline]
    pub fn storage_base_url(&self) -> String {
        self.settings.read().storage_base_url.clone()
    }

    #[inline]
    pub fn pen_color(&self) -> String {
        self.settings.read().pen_color.clone()
    }

    #[inline]
    pub fn pen_thickness(&self) -> f32 {
        self.settings.read().pen_thickness
    }

    #[inline]
    pub fn log_filter(&self) -> String {
        self.settings.read().log_filter.clone()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
