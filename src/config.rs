/// Configuration for the resolver and the command line tool
///
/// Stored as JSON. Every field has a default, so a partial file (or no
/// file at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::images::candidates::IMAGE_EXTENSIONS;
use crate::images::resolver::{ImageResolver, PLACEHOLDER_PATH};
use crate::images::url::{UrlNormalizer, IMAGE_DIR};
use crate::sources::probe::DEFAULT_BATCH_SIZE;

const APP_DIR: &str = "perfume-images";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Folder bare filenames live in, and the prefix given to scanned files
    pub image_dir: String,

    /// Image returned when nothing matches
    pub placeholder: String,

    /// Extensions tried when probing for files
    pub extensions: Vec<String>,

    /// How many existence probes run at once
    pub probe_batch_size: usize,

    /// Names probed when no listing is available (brand names, usually)
    pub probe_names: Vec<String>,

    /// Catalog database location; defaults to the user data directory
    pub database_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: IMAGE_DIR.to_string(),
            placeholder: PLACEHOLDER_PATH.to_string(),
            extensions: IMAGE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            probe_batch_size: DEFAULT_BATCH_SIZE,
            probe_names: Vec::new(),
            database_path: None,
        }
    }
}

impl Config {
    /// Default config file location
    /// - Linux: ~/.config/perfume-images/config.json
    /// - macOS: ~/Library/Application Support/perfume-images/config.json
    /// - Windows: %APPDATA%\perfume-images\config.json
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or(Error::NoUserDir("config"))?;
        path.push(APP_DIR);
        path.push("config.json");
        Ok(path)
    }

    /// Default catalog database location (e.g. ~/.local/share/perfume-images/catalog.db)
    pub fn default_database_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(Error::NoUserDir("data"))?;
        path.push(APP_DIR);
        path.push("catalog.db");
        Ok(path)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Convert to a pretty JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.placeholder.trim().is_empty() {
            return Err(Error::InvalidConfig("placeholder must not be empty".to_string()));
        }
        if self.probe_batch_size == 0 {
            return Err(Error::InvalidConfig("probe_batch_size must be at least 1".to_string()));
        }
        if self.extensions.is_empty() {
            return Err(Error::InvalidConfig("extensions must not be empty".to_string()));
        }
        Ok(())
    }

    /// Database path from the config, or the default location
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_database_path(),
        }
    }

    pub fn resolver(&self) -> ImageResolver {
        ImageResolver::new(self.placeholder.as_str())
    }

    pub fn url_normalizer(&self) -> UrlNormalizer {
        UrlNormalizer::new(self.image_dir.as_str(), self.placeholder.as_str())
    }
}
