//! Configuration management for confbook

use crate::error::{ConfbookError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".confbook/config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Storage settings
    pub storage: StorageConfig,
    /// Comment settings
    pub comments: CommentsConfig,
    /// HTTP cache settings
    pub cache: CacheConfig,
    /// Locale settings
    pub locale: LocaleConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfbookError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(ConfbookError::FileNotFound(_)) => {
                tracing::debug!("No configuration at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfbookError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML text
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfbookError::Toml(e.to_string()))
    }

    /// Write configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.comments.page_size == 0 {
            return Err(ConfbookError::Config(
                "comments.page_size must be at least 1".to_string(),
            ));
        }
        if !self
            .locale
            .supported_locales
            .contains(&self.locale.default_locale)
        {
            return Err(ConfbookError::Config(format!(
                "locale.default_locale '{}' is not in locale.supported_locales",
                self.locale.default_locale
            )));
        }
        for (key, secs) in [
            ("cache.shared_max_age", self.cache.shared_max_age),
            ("cache.step_info_ttl", self.cache.step_info_ttl),
        ] {
            if secs > MAX_CACHE_TTL_SECS {
                return Err(ConfbookError::Config(format!(
                    "{} must be at most {} seconds",
                    key, MAX_CACHE_TTL_SECS
                )));
            }
        }
        if self.server.base_url.trim().is_empty() {
            return Err(ConfbookError::Config(
                "server.base_url cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory holding uploaded photos
    pub fn photo_dir(&self) -> PathBuf {
        self.storage
            .photo_dir
            .clone()
            .unwrap_or_else(|| self.storage.data_dir.join("uploads/photos"))
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Prod,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: String,
    /// Absolute base URL used to build review links
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            base_url: "http://127.0.0.1:8000".to_string(),
            environment: Environment::Dev,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for comments, conferences and the outbox
    pub data_dir: PathBuf,
    /// Photo upload directory (defaults to `<data_dir>/uploads/photos`)
    pub photo_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".confbook/data"),
            photo_dir: None,
        }
    }
}

/// Comment-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Comments per page on a conference page
    pub page_size: usize,
    /// Maximum comment text length
    pub max_text_length: usize,
    /// Maximum author name length
    pub max_author_length: usize,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            page_size: 2,
            max_text_length: 2000,
            max_author_length: 255,
        }
    }
}

/// Upper bound for every cache lifetime, in seconds (one year)
pub const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// HTTP cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Shared max age for cacheable pages, in seconds
    pub shared_max_age: u64,
    /// Lifetime of the cached step info, in seconds
    pub step_info_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            shared_max_age: 3600,
            step_info_ttl: 30,
        }
    }
}

/// Locale configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Locale used when redirecting from `/`
    pub default_locale: String,
    /// Locales accepted in URLs
    pub supported_locales: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string(), "fr".to_string()],
        }
    }
}

impl LocaleConfig {
    /// Check whether a locale may appear in a URL
    pub fn is_supported(&self, locale: &str) -> bool {
        self.supported_locales.iter().any(|l| l == locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.comments.page_size, 2);
        assert_eq!(config.cache.shared_max_age, 3600);
        assert_eq!(config.cache.step_info_ttl, 30);
        assert_eq!(config.server.environment, Environment::Dev);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[comments]"));

        let config2 = Config::from_toml(&toml).unwrap();
        assert_eq!(config.comments.page_size, config2.comments.page_size);
        assert_eq!(config.server.base_url, config2.server.base_url);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            environment = "prod"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.environment, Environment::Prod);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.comments.page_size, 2);
    }

    #[test]
    fn test_invalid_default_locale_rejected() {
        let result = Config::from_toml(
            r#"
            [locale]
            default_locale = "de"
            "#,
        );
        assert!(matches!(result, Err(ConfbookError::Config(_))));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = Config::from_toml("[comments]\npage_size = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_cache_ttl_rejected() {
        let result = Config::from_toml(&format!("[cache]\nstep_info_ttl = {}\n", i64::MAX));
        assert!(matches!(result, Err(ConfbookError::Config(ref m)) if m.contains("step_info_ttl")));

        let mut config = Config::default();
        config.cache.shared_max_age = MAX_CACHE_TTL_SECS + 1;
        assert!(config.validate().is_err());
        config.cache.shared_max_age = MAX_CACHE_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");

        let mut config = Config::default();
        config.comments.page_size = 5;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.comments.page_size, 5);
    }

    #[test]
    fn test_load_or_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_or_default(&temp.path().join("missing.toml")).unwrap();
        assert_eq!(config.comments.page_size, 2);
        assert!(Config::load(&temp.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_photo_dir_default() {
        let config = Config::default();
        assert_eq!(
            config.photo_dir(),
            PathBuf::from(".confbook/data/uploads/photos")
        );
    }
}
