//! Configuration.
//!
//! Read from `<config_dir>/campus/config.toml`, then overridden by
//! environment variables. Every field has a default, so a missing file is
//! not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://fardheenkp.pythonanywhere.com";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:58232";
pub const DEFAULT_PROXY_PORT: u16 = 58232;

const APP_DIR: &str = "campus";
const CONFIG_FILE: &str = "config.toml";
const STORAGE_FILE: &str = "storage.json";
const GALLERY_FILE: &str = "galleryData.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Social API base URL.
    pub api_url: String,
    /// Where client storage lives. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// Curated gallery file. Defaults to `galleryData.json` in the data dir
    /// when present, else the catalogue built into the binary.
    pub gallery: Option<PathBuf>,
    /// Base URL of the gallery proxy used for image search.
    pub gallery_proxy: String,
    /// Port `campus serve` listens on.
    pub proxy_port: u16,
    /// Pexels key, only read by `campus serve`.
    pub pexels_api_key: Option<String>,
    /// Request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
            gallery: None,
            gallery_proxy: DEFAULT_PROXY_URL.to_string(),
            proxy_port: DEFAULT_PROXY_PORT,
            pexels_api_key: None,
            timeout_secs: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply the environment.
    pub fn load() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Override fields from environment variables, looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("CAMPUS_API_URL") {
            self.api_url = url;
        }
        if let Some(dir) = var("CAMPUS_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = var("CAMPUS_GALLERY") {
            self.gallery = Some(PathBuf::from(path));
        }
        if let Some(url) = var("CAMPUS_GALLERY_PROXY") {
            self.gallery_proxy = url;
        }
        if let Some(key) = var("PEXELS_API_KEY") {
            self.pexels_api_key = Some(key);
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir().context("Could not find data directory")?;
        Ok(base.join(APP_DIR))
    }

    /// The client storage file.
    pub fn storage_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(STORAGE_FILE))
    }

    /// The gallery file to read, or `None` for the bundled catalogue.
    pub fn gallery_path(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.gallery {
            return Ok(Some(path.clone()));
        }
        let path = self.data_dir()?.join(GALLERY_FILE);
        Ok(path.exists().then_some(path))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_url = \"http://localhost:8000\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.gallery_proxy, DEFAULT_PROXY_URL);
        assert_eq!(config.pexels_api_key, None);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_url = [").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CAMPUS_API_URL", "http://api.test"),
            ("CAMPUS_DATA_DIR", "/tmp/campus-data"),
            ("CAMPUS_GALLERY", "/srv/gallery.json"),
            ("PEXELS_API_KEY", "  "),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| (*v).to_string()));

        assert_eq!(config.api_url, "http://api.test");
        assert_eq!(
            config.storage_path().unwrap(),
            PathBuf::from("/tmp/campus-data/storage.json")
        );
        assert_eq!(config.pexels_api_key, None);
        assert_eq!(
            config.gallery_path().unwrap(),
            Some(PathBuf::from("/srv/gallery.json"))
        );
        assert_eq!(config.timeout(), None);
    }
}
