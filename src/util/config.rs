//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.asset-bridge/config.toml` - User-wide defaults
//! - Project: `.asset-bridge/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.
//!
//! Credentials are stored separately in `~/.asset-bridge/auth.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::io::Credentials;

/// Default network timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Directory for the metadata cache and git mirrors
    pub cache_dir: Option<PathBuf>,

    /// Whether credentials may be prompted for
    pub interactive: Option<bool>,

    /// Network settings
    pub net: NetConfig,

    /// GitHub settings
    pub github: GitHubConfig,

    /// Registry options, keys prefixed with the asset type (`bower-searchable`)
    pub asset_registry_options: IndexMap<String, Value>,

    /// VCS repository declarations
    pub repositories: Vec<Value>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Request timeout in seconds
    pub timeout: Option<u64>,
}

impl NetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

/// GitHub-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Use plain git instead of the REST API
    pub no_api: Option<bool>,

    /// Hosts served by GitHub (defaults to github.com)
    pub domains: Option<Vec<String>>,

    /// Token sent with every API request
    pub oauth_token: Option<String>,
}

impl GitHubConfig {
    pub fn domains(&self) -> Vec<String> {
        self.domains
            .clone()
            .unwrap_or_else(|| vec!["github.com".to_string()])
    }

    pub fn no_api(&self) -> bool {
        self.no_api.unwrap_or(false)
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }
        if other.interactive.is_some() {
            self.interactive = other.interactive;
        }
        if other.net.timeout.is_some() {
            self.net.timeout = other.net.timeout;
        }
        if other.github.no_api.is_some() {
            self.github.no_api = other.github.no_api;
        }
        if other.github.domains.is_some() {
            self.github.domains = other.github.domains;
        }
        if other.github.oauth_token.is_some() {
            self.github.oauth_token = other.github.oauth_token;
        }
        self.asset_registry_options
            .extend(other.asset_registry_options);
        self.repositories.extend(other.repositories);
    }

    /// Registry options of one asset type, with the `<asset>-` prefix removed.
    pub fn registry_options(&self, asset: &str) -> IndexMap<String, Value> {
        let prefix = format!("{}-", asset);
        self.asset_registry_options
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|key| (key.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.asset-bridge/config.toml)
/// 2. Global config (~/.asset-bridge/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Stored credentials, keyed by host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AuthConfig {
    pub http_basic: IndexMap<String, Credentials>,
}

impl AuthConfig {
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|contents| Ok(toml::from_str(&contents)?))
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to load credentials from {}: {:#}", path.display(), e);
                Self::default()
            })
    }

    /// Save credentials to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize credentials")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write credentials: {}", path.display()))?;

        Ok(())
    }
}

/// Get the global config directory (~/.asset-bridge).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".asset-bridge"))
}

/// Get the global config path (~/.asset-bridge/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the credentials path (~/.asset-bridge/auth.toml).
pub fn auth_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("auth.toml"))
}

/// Get the project config path (.asset-bridge/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".asset-bridge").join("config.toml")
}
