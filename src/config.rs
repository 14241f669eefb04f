// ABOUTME: Configuration loading for rave.
// ABOUTME: Reads ~/.rave/config.toml, falling back to defaults for every missing key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::identity::DEFAULT_SHARE_PREFIX;
use crate::session::DEFAULT_HUSH_CODE;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub share: ShareConfig,
    pub revisions: RevisionsConfig,
    pub catalog: CatalogConfig,
}

/// Live session behaviour.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub hush_code: String,
    /// How often the visual overlay flag is reconciled with the visual engine.
    pub visual_poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hush_code: DEFAULT_HUSH_CODE.to_string(),
            visual_poll_ms: 1000,
        }
    }
}

impl SessionConfig {
    pub fn visual_poll_interval(&self) -> Duration {
        Duration::from_millis(self.visual_poll_ms.max(1))
    }
}

/// Share link format.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub prefix: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_SHARE_PREFIX.to_string(),
        }
    }
}

/// Where revision histories are stored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RevisionsConfig {
    pub path: Option<PathBuf>,
}

/// Optional sound map used by the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load config from ~/.rave/config.toml, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Base directory for rave's files.
    pub fn base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rave")
    }

    /// Path to the config file.
    pub fn config_path() -> PathBuf {
        Self::base_dir().join("config.toml")
    }

    /// Path to the revisions file, honouring the configured override.
    pub fn revisions_path(&self) -> PathBuf {
        self.revisions
            .path
            .clone()
            .unwrap_or_else(|| Self::base_dir().join("revisions.json"))
    }
}
