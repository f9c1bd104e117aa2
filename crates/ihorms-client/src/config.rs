use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::auth::LoginEncoding;

const APP_NAME: &str = "ihorms";
const CONFIG_FILE: &str = "config.json";

/// Paths of the authentication exchanges, relative to the API prefix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthEndpoints {
    #[serde(default = "default_login_path")]
    pub login: String,
    #[serde(default = "default_refresh_path")]
    pub refresh: String,
    #[serde(default = "default_me_path")]
    pub me: String,
    #[serde(default = "default_logout_path")]
    pub logout: String,
}

fn default_login_path() -> String {
    "/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_me_path() -> String {
    "/auth/me".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login: default_login_path(),
            refresh: default_refresh_path(),
            me: default_me_path(),
            logout: default_logout_path(),
        }
    }
}

impl AuthEndpoints {
    /// Returns true if `path` is one of the credential exchanges that must
    /// never trigger a refresh-and-retry
    pub fn is_exchange(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path).trim_matches('/');
        [&self.login, &self.refresh, &self.logout]
            .iter()
            .any(|p| p.trim_matches('/') == path)
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Fixed prefix between the base URL and every endpoint. May be empty.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default)]
    pub login_encoding: LoginEncoding,
    #[serde(default)]
    pub auth: AuthEndpoints,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            login_encoding: LoginEncoding::default(),
            auth: AuthEndpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointed at another server
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds the full URL for an endpoint path
    ///
    /// Absolute `http(s)://` URLs are returned unchanged.
    pub fn endpoint_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');

        match (prefix.is_empty(), path.is_empty()) {
            (true, true) => base.to_string(),
            (true, false) => format!("{base}/{path}"),
            (false, true) => format!("{base}/{prefix}"),
            (false, false) => format!("{base}/{prefix}/{path}"),
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    path: PathBuf,
    config: RwLock<ClientConfig>,
}

impl ConfigManager {
    /// Loads the configuration from the per-user config directory
    pub fn new() -> Result<Self> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        Self::from_path(config_dir.join(CONFIG_FILE))
    }

    /// Loads the configuration from an explicit file
    ///
    /// A missing file yields the defaults. So does a file that fails to parse,
    /// after a warning.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let config = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                ClientConfig::default()
            })
        } else {
            ClientConfig::default()
        };

        Ok(Self {
            path,
            config: RwLock::new(config),
        })
    }

    /// Gets a copy of the current configuration
    pub fn get(&self) -> ClientConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Updates and saves the configuration
    pub fn save(&self, config: ClientConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        std::fs::write(&self.path, json).context("Failed to write config file")?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;

        Ok(())
    }

    /// Path of the backing config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join(APP_NAME))
    }
}
