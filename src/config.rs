use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::search::SearchMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Archive snapshot to open (default: `<data_dir>/archive.json`)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Root for attachments and deletion manifests (default: platform data dir)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Where exported attachment zips are written (default: current directory)
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: ThemeVariant,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    #[serde(rename = "high-contrast")]
    HighContrast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Mode the inline search bar starts in
    #[serde(default)]
    pub default_mode: SearchMode,
    #[serde(default = "default_fast_debounce_ms")]
    pub fast_debounce_ms: u64,
    #[serde(default = "default_deep_debounce_ms")]
    pub deep_debounce_ms: u64,
    /// Results fetched per search page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: ThemeVariant::default(),
            date_format: default_date_format(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_mode: SearchMode::default(),
            fast_debounce_ms: default_fast_debounce_ms(),
            deep_debounce_ms: default_deep_debounce_ms(),
            page_size: default_page_size(),
        }
    }
}

fn default_date_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

fn default_fast_debounce_ms() -> u64 {
    crate::constants::FAST_SEARCH_DEBOUNCE_MS
}

fn default_deep_debounce_ms() -> u64 {
    crate::constants::DEEP_SEARCH_DEBOUNCE_MS
}

fn default_page_size() -> usize {
    crate::constants::SEARCH_PAGE_SIZE
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("vaultnav");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Data directory: explicit override or the platform default
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.archive.data_dir {
            return Ok(dir.clone());
        }
        let dir = dirs::data_local_dir()
            .context("Could not find data directory")?
            .join("vaultnav");
        Ok(dir)
    }

    pub fn archive_path(&self) -> Result<PathBuf> {
        match &self.archive.path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("archive.json")),
        }
    }

    pub fn attachments_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("attachments"))
    }

    pub fn deletions_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("deletions"))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.archive
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load the config file, falling back to defaults when none exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::config_dir()?)?;
        fs::create_dir_all(self.data_dir()?)?;
        Ok(())
    }
}
