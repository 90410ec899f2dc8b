//! Site profile configuration.
//!
//! A site profile names the backend instance to talk to and the API key
//! pair to authenticate with. Profiles are YAML files; every setting can
//! also be supplied (or overridden) through the environment, so CI jobs
//! can run without a profile on disk.
//!
//! # Example YAML
//!
//! ```yaml
//! url: "https://erp.example.com"
//! api_key: "a1b2c3d4e5f6a7b"
//! api_secret: "0f9e8d7c6b5a493"
//! ```
//!
//! Resolution order: an explicit `--site` path wins, then the
//! `METAFORGE_SITE` path variable, then `~/.metaforge/site.yaml` if it
//! exists. `METAFORGE_SITE_URL`, `METAFORGE_API_KEY` and
//! `METAFORGE_API_SECRET` override individual values afterwards.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an alternative profile path.
pub const SITE_PATH_ENV: &str = "METAFORGE_SITE";
/// Environment override for the backend base URL.
pub const SITE_URL_ENV: &str = "METAFORGE_SITE_URL";
/// Environment override for the API key.
pub const API_KEY_ENV: &str = "METAFORGE_API_KEY";
/// Environment override for the API secret.
pub const API_SECRET_ENV: &str = "METAFORGE_API_SECRET";

/// Connection settings for one backend site.
///
/// # Examples
///
/// ```
/// use metaforge_client::SiteConfig;
///
/// let config = SiteConfig {
///     url: "https://erp.example.com".to_string(),
///     api_key: "key".to_string(),
///     api_secret: "secret".to_string(),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the backend site, without a trailing `/api`.
    #[serde(default)]
    pub url: String,
    /// API key of the acting user.
    #[serde(default)]
    pub api_key: String,
    /// API secret paired with the key.
    #[serde(default)]
    pub api_secret: String,
}

impl SiteConfig {
    /// Loads a profile from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the profile as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Default profile location (`~/.metaforge/site.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".metaforge").join("site.yaml"))
    }

    /// Applies `METAFORGE_SITE_URL` / `METAFORGE_API_KEY` /
    /// `METAFORGE_API_SECRET` on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(SITE_URL_ENV) {
            if !url.is_empty() {
                self.url = url;
            }
        }
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api_key = key;
            }
        }
        if let Ok(secret) = std::env::var(API_SECRET_ENV) {
            if !secret.is_empty() {
                self.api_secret = secret;
            }
        }
    }

    /// Resolves the effective profile.
    ///
    /// `explicit` (the `--site` flag) must exist when given; the
    /// `METAFORGE_SITE` path must exist when set. The default path is
    /// optional — when absent, resolution starts from an empty profile and
    /// relies on the environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ProfileNotFound`] for a named-but-missing
    /// file, or [`ConfigError::MissingValue`] when a required setting is
    /// still empty after overrides.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match profile_path(explicit)? {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading site profile");
                Self::load(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Checks that every required setting is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingValue("url", SITE_URL_ENV));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("api_key", API_KEY_ENV));
        }
        if self.api_secret.trim().is_empty() {
            return Err(ConfigError::MissingValue("api_secret", API_SECRET_ENV));
        }
        Ok(())
    }

    /// Base URL with any trailing slashes removed.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

fn profile_path(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::ProfileNotFound(path.display().to_string()));
        }
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(path) = std::env::var(SITE_PATH_ENV) {
        if !path.is_empty() {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::ProfileNotFound(path.display().to_string()));
            }
            return Ok(Some(path));
        }
    }
    Ok(SiteConfig::default_path().filter(|p| p.exists()))
}
