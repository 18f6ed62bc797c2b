//! Configuration management for vidsync using the prefer crate.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// User agent for HTTP requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Cap on items pulled per import run.
    pub max_results: Option<u32>,
    /// Service API keys passed to feed readers.
    pub api_keys: HashMap<String, String>,
    /// Domain of the default site imported videos attach to.
    pub site_domain: String,
    /// Display name of the default site.
    pub site_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("vidsync");

        Self {
            data_dir,
            database_filename: "vidsync.db".to_string(),
            user_agent: "vidsync/0.4 (feed import)".to_string(),
            request_timeout: 30,
            max_results: None,
            api_keys: HashMap::new(),
            site_domain: "localhost".to_string(),
            site_name: "Default site".to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default)]
    pub target: Option<String>,
    /// Database filename.
    #[serde(default)]
    pub database: Option<String>,
    /// User agent string.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub request_timeout: Option<u64>,
    /// Cap on items pulled per import run.
    #[serde(default)]
    pub max_results: Option<u32>,
    /// Service API keys, keyed by service name.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Domain of the default site.
    #[serde(default)]
    pub site_domain: Option<String>,
    /// Display name of the default site.
    #[serde(default)]
    pub site_name: Option<String>,
}

impl Config {
    /// Load configuration using the prefer crate, which discovers vidsync
    /// config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("vidsync").await {
            Ok(pref_config) => {
                let target: Option<String> = pref_config.get("target").ok();
                let database: Option<String> = pref_config.get("database").ok();
                let user_agent: Option<String> = pref_config.get("user_agent").ok();
                let request_timeout: Option<u64> = pref_config.get("request_timeout").ok();
                let max_results: Option<u32> = pref_config.get("max_results").ok();
                let api_keys: HashMap<String, String> =
                    pref_config.get("api_keys").unwrap_or_default();
                let site_domain: Option<String> = pref_config.get("site_domain").ok();
                let site_name: Option<String> = pref_config.get("site_name").ok();

                Config {
                    target,
                    database,
                    user_agent,
                    request_timeout,
                    max_results,
                    api_keys,
                    site_domain,
                    site_name,
                }
            }
            Err(_) => {
                // No config file found, use defaults.
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref target) = self.target {
            let path = shellexpand::tilde(target);
            settings.data_dir = PathBuf::from(path.as_ref());
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(max_results) = self.max_results {
            settings.max_results = Some(max_results);
        }
        if !self.api_keys.is_empty() {
            settings.api_keys = self.api_keys.clone();
        }
        if let Some(ref site_domain) = self.site_domain {
            settings.site_domain = site_domain.clone();
        }
        if let Some(ref site_name) = self.site_name {
            settings.site_name = site_name.clone();
        }
    }
}

/// Failure reading an explicit configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load settings from configuration.
pub async fn load_settings() -> Settings {
    let config = Config::load().await;
    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    settings
}
