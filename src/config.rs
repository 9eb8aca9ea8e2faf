use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{OptionExt, Result, WrapErr, bail};
use serde::{Deserialize, Serialize};

use crate::spotify_rs::client::MAX_SAVED_TRACKS_PAGE;

const APP_DIR: &str = "liked-sync";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot file; defaults to the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot: Option<String>,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub ytmusic: YtMusicConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtMusicConfig {
    /// Browser request headers file; defaults to the config directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    headers: Option<String>,
    #[serde(default = "default_liked_limit")]
    pub liked_limit: u32,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: NonZeroU32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per like mutation, 1 disables retries
    #[serde(default = "default_like_attempts")]
    pub like_attempts: usize,
}

fn default_redirect_uri() -> String {
    DEFAULT_REDIRECT_URI.to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_liked_limit() -> u32 {
    1600
}

fn default_requests_per_second() -> NonZeroU32 {
    NonZeroU32::MIN.saturating_add(4)
}

fn default_like_attempts() -> usize {
    1
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            refresh_token: None,
            page_size: default_page_size(),
        }
    }
}

impl Default for YtMusicConfig {
    fn default() -> Self {
        Self {
            headers: None,
            liked_limit: default_liked_limit(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            like_attempts: default_like_attempts(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let page_size = self.spotify.page_size;
        if !(1..=MAX_SAVED_TRACKS_PAGE).contains(&page_size) {
            bail!(
                "spotify.page_size must be between 1 and {}, got {}",
                MAX_SAVED_TRACKS_PAGE,
                page_size
            );
        }
        Ok(())
    }

    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIR).join("config.toml"))
    }

    /// Load the config from the default location, falling back to defaults
    /// when no file exists yet
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or_eyre("No config directory found")?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        Self::from_file(&config_path)
    }

    /// Write a default config file, refusing to overwrite an existing one
    pub fn create_default() -> Result<PathBuf> {
        let config_path = Self::config_path().ok_or_eyre("No config directory found")?;
        if config_path.exists() {
            bail!("Config file already exists: {}", config_path.display());
        }
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(&Self::default())
            .wrap_err("Failed to serialize default config")?;
        std::fs::write(&config_path, contents)
            .wrap_err_with(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        match &self.snapshot {
            Some(path) => Self::expand_path(path),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("liked_songs.json"),
        }
    }

    pub fn ytmusic_headers_path(&self) -> PathBuf {
        match &self.ytmusic.headers {
            Some(path) => Self::expand_path(path),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("browser.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config.spotify.page_size, 50);
        assert_eq!(config.spotify.redirect_uri, DEFAULT_REDIRECT_URI);
        assert!(config.spotify.refresh_token.is_none());
        assert_eq!(config.ytmusic.liked_limit, 1600);
        assert_eq!(config.ytmusic.requests_per_second.get(), 5);
        assert_eq!(config.retry.like_attempts, 1);
        assert!(config.snapshot_path().ends_with("liked-sync/liked_songs.json"));
        assert!(config.ytmusic_headers_path().ends_with("liked-sync/browser.json"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            snapshot = "/tmp/liked.json"

            [spotify]
            client_id = "id"
            client_secret = "secret"
            refresh_token = "refresh"
            page_size = 20

            [ytmusic]
            headers = "/tmp/browser.json"
            liked_limit = 5000
            requests_per_second = 2

            [retry]
            like_attempts = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/liked.json"));
        assert_eq!(config.spotify.client_id, "id");
        assert_eq!(config.spotify.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(config.spotify.page_size, 20);
        assert_eq!(config.ytmusic_headers_path(), PathBuf::from("/tmp/browser.json"));
        assert_eq!(config.ytmusic.liked_limit, 5000);
        assert_eq!(config.retry.like_attempts, 3);
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        assert!(Config::from_toml("[ytmusic]\nrequests_per_second = 0").is_err());
    }

    #[test]
    fn test_page_size_outside_spotify_limits_is_rejected() {
        let error = Config::from_toml("[spotify]\npage_size = 100").unwrap_err();
        assert!(error.to_string().contains("page_size"));
        assert!(Config::from_toml("[spotify]\npage_size = 0").is_err());
        assert_eq!(
            Config::from_toml("[spotify]\npage_size = 50")
                .unwrap()
                .spotify
                .page_size,
            50
        );
    }

    #[test]
    fn test_expand_home_path() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                Config::expand_path("~/music/liked.json"),
                home.join("music/liked.json")
            );
        }
        assert_eq!(
            Config::expand_path("relative/liked.json"),
            PathBuf::from("relative/liked.json")
        );
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let contents = toml::to_string_pretty(&Config::default()).unwrap();
        let config = Config::from_toml(&contents).unwrap();
        assert_eq!(config.spotify.page_size, 50);
    }
}
