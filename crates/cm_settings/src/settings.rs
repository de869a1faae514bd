use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::defaults::*;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // Endpoints
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Public base URL of the object storage bucket.
    #[serde(default = "default_storage_base_url")]
    pub storage_base_url: String,

    // Pen
    #[serde(default = "default_pen_color")]
    pub pen_color: String,
    #[serde(default = "default_pen_thickness")]
    pub pen_thickness: f32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// `tracing` filter directive (overridden by `RUST_LOG`).
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            storage_base_url: default_storage_base_url(),
            pen_color: default_pen_color(),
            pen_thickness: default_pen_thickness(),
            request_timeout_secs: default_request_timeout_secs(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    fn settings_dir() -> PathBuf {
        default_home_dir().join(".checkmate_review")
    }

    /// Default settings file location.
    pub fn settings_path() -> PathBuf {
        Self::settings_dir().join("settings.json")
    }

    /// Load settings from the default location.
    ///
    /// Falls back to defaults if loading fails.
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`.
    ///
    /// A missing file is created with defaults; an unreadable one is left alone and
    /// defaults are used.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => return settings.normalized(),
                Err(e) => warn!(path = %path.display(), error = %e, "invalid settings file, using defaults"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let default_settings = Self::default();
                if let Err(e) = default_settings.save_to(path) {
                    debug!(path = %path.display(), error = %e, "could not persist default settings");
                }
                return default_settings;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not read settings file"),
        }
        Self::default()
    }

    /// Save settings to the default location.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::settings_path())
    }

    /// Save settings to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Clamp out-of-range values.
    pub fn normalized(mut self) -> Self {
        self.pen_thickness = if self.pen_thickness.is_finite() {
            self.pen_thickness.clamp(MIN_PEN_THICKNESS, MAX_PEN_THICKNESS)
        } else {
            default_pen_thickness()
        };
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `{api_base_url}/{path}`
    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.api_base_url, path)
    }

    /// Public URL of an uploaded object.
    pub fn storage_url(&self, file_name: &str) -> String {
        join_url(&self.storage_base_url, file_name)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
