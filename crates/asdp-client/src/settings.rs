//! Client settings persisted as TOML.
//!
//! Settings are read from the user's config directory. A missing or
//! corrupt file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Backend address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Environment variable overriding [`ServerSettings::base_url`].
pub const BASE_URL_ENV: &str = "ASDP_BASE_URL";

/// Default request timeout; processing large datasets is slow.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Backend connection settings.
    pub server: ServerSettings,

    /// Export settings.
    pub export: ExportSettings,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the processing backend.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServerSettings {
    /// Request timeout as a duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where exported reports and datasets are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output directory; the current directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Open HTML reports in the system viewer after saving.
    pub open_html_reports: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            open_html_reports: true,
        }
    }
}

impl ExportSettings {
    /// Resolved output directory.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

impl ClientSettings {
    /// Load settings from the default path and apply environment overrides.
    #[must_use]
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::config_path());
        settings.apply_env();
        settings
    }

    /// Load settings from a specific path.
    #[must_use]
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable settings file {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Apply overrides from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV)
            && !base_url.trim().is_empty()
        {
            self.server.base_url = base_url;
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ClientError::Settings(format!("failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClientError::Settings(format!("failed to serialize settings: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ClientError::Settings(format!("failed to write settings: {e}")))
    }

    /// Get the default config file path.
    #[must_use]
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("in", "MoSPI", "ASDP")
            .map(|dirs| dirs.config_dir().join("client.toml"))
            .unwrap_or_else(|| PathBuf::from("asdp-client.toml"))
    }
}
